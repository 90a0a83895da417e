// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

// Headers used in aws services.
pub const X_AMZ_DATE: &str = "x-amz-date";
pub const X_AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";
pub const X_AMZN_AUTHORIZATION: &str = "x-amzn-authorization";

// Prefix of headers taking part in the S3 string to sign.
pub const X_AMZ_PREFIX: &str = "x-amz";

// Query params used in aws services.
pub const AWS_ACCESS_KEY_ID: &str = "AWSAccessKeyId";
pub const SIGNATURE: &str = "Signature";
pub const SIGNATURE_METHOD: &str = "SignatureMethod";
pub const SIGNATURE_VERSION: &str = "SignatureVersion";
pub const TIMESTAMP: &str = "Timestamp";
pub const SECURITY_TOKEN: &str = "SecurityToken";
pub const EXPIRES: &str = "Expires";

// Algorithms.
pub const HMAC_SHA256: &str = "HmacSHA256";
pub const AWS4_HMAC_SHA256: &str = "AWS4-HMAC-SHA256";

/// Content type used when the caller didn't set one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

// Endpoint naming.
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_SERVICE: &str = "s3";
pub const LEGACY_REGION: &str = "external-1";
pub const S3_REGION_PREFIX: &str = "s3-";
pub const EXECUTE_API: &str = "execute-api";

/// Query keys that name an S3 sub-resource, in the order they are appended
/// to the canonical resource.
pub const S3_SUB_RESOURCES: [&str; 15] = [
    "acl",
    "lifecycle",
    "location",
    "logging",
    "notification",
    "partNumber",
    "policy",
    "requestPayment",
    "torrent",
    "uploadId",
    "uploads",
    "versionId",
    "versioning",
    "versions",
    "website",
];

/// AsciiSet for [AWS UriEncode](https://docs.aws.amazon.com/AmazonS3/latest/API/sig-v4-header-based-auth.html)
///
/// - URI encode every byte except the unreserved characters: 'A'-'Z', 'a'-'z', '0'-'9', '-', '.', '_', and '~'.
/// - `/` is encoded too, so this set is used for query pairs and single path
/// segments.
pub static AWS_QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
