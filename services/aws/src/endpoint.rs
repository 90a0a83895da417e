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

//! Classify AWS endpoints.
//!
//! See [AWS service endpoints](https://docs.aws.amazon.com/general/latest/gr/rande.html).

use crate::constants::{
    DEFAULT_REGION, DEFAULT_SERVICE, EXECUTE_API, LEGACY_REGION, S3_REGION_PREFIX,
};

/// Parse a host name into `(service, region)`.
///
/// Handles hosts like:
///
/// - `iam.amazonaws.com` => `(iam, us-east-1)`
/// - `sqs.us-west-2.amazonaws.com` => `(sqs, us-west-2)`
/// - `bucket.s3-eu-west-1.amazonaws.com` => `(s3, eu-west-1)`
/// - `abcd.execute-api.eu-west-1.amazonaws.com` => `(execute-api, eu-west-1)`
///
/// Never fails: hosts that don't look like an AWS endpoint fall back to
/// the default service and region. The host is expected without port.
pub fn service_and_region(host: &str) -> (String, String) {
    let mut service = DEFAULT_SERVICE;
    let mut region = DEFAULT_REGION;

    let labels: Vec<&str> = host.split('.').collect();
    match labels.as_slice() {
        // Either service.region.amazonaws.com or bucket.s3(-region).amazonaws.com
        [first, second, _, _] => {
            if *second == DEFAULT_SERVICE {
                service = DEFAULT_SERVICE;
            } else if let Some(r) = second.strip_prefix(S3_REGION_PREFIX) {
                service = DEFAULT_SERVICE;
                region = r;
            } else {
                service = *first;
                region = *second;
            }
        }
        [_, second, third, _, _] if *second == EXECUTE_API => {
            service = *second;
            region = *third;
        }
        [_, second, third, _, _] => {
            service = *third;
            region = *second;
        }
        // Either service.amazonaws.com or s3-region.amazonaws.com
        [first, ..] => {
            if let Some(r) = first.strip_prefix(S3_REGION_PREFIX) {
                region = r;
            } else {
                service = *first;
            }
        }
        [] => {}
    }

    if region == LEGACY_REGION {
        region = DEFAULT_REGION;
    }
    // Empty labels from hosts like `.amazonaws.com` must not leak out.
    if service.is_empty() {
        service = DEFAULT_SERVICE;
    }
    if region.is_empty() {
        region = DEFAULT_REGION;
    }

    (service.to_string(), region.to_string())
}

/// Get the bucket name if the host uses S3 virtual-hosted-style addressing.
///
/// That's `bucket.s3.amazonaws.com` or `bucket.s3-region.amazonaws.com`:
/// the service is s3 and the host has exactly four labels.
pub fn virtual_hosted_bucket(host: &str) -> Option<&str> {
    let (service, _) = service_and_region(host);
    if service != DEFAULT_SERVICE || host.matches('.').count() != 3 {
        return None;
    }

    host.split('.').next().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("iam.amazonaws.com", "iam", "us-east-1"; "global service")]
    #[test_case("sqs.us-west-2.amazonaws.com", "sqs", "us-west-2"; "regional service")]
    #[test_case("johnsmith.s3.amazonaws.com", "s3", "us-east-1"; "virtual hosted bucket")]
    #[test_case("johnsmith.s3-eu-west-1.amazonaws.com", "s3", "eu-west-1"; "virtual hosted bucket with region")]
    #[test_case("s3-eu-west-1.amazonaws.com", "s3", "eu-west-1"; "path style with region")]
    #[test_case("s3.amazonaws.com", "s3", "us-east-1"; "path style")]
    #[test_case("s3-external-1.amazonaws.com", "s3", "us-east-1"; "legacy region alias")]
    #[test_case("sdb.external-1.amazonaws.com", "sdb", "us-east-1"; "legacy region alias with service")]
    #[test_case("1234abcd56.execute-api.eu-west-1.amazonaws.com", "execute-api", "eu-west-1"; "api gateway")]
    #[test_case("johnsmith.eu-west-1.es.amazonaws.com", "es", "eu-west-1"; "five labels")]
    #[test_case("email.us-east-1.amazonaws.com", "email", "us-east-1"; "ses")]
    #[test_case("localhost", "localhost", "us-east-1"; "single label")]
    #[test_case("", "s3", "us-east-1"; "empty host")]
    #[test_case(".....", "s3", "us-east-1"; "only dots")]
    #[test_case("a..b.c", "a", "us-east-1"; "empty second label")]
    fn test_service_and_region(host: &str, service: &str, region: &str) {
        assert_eq!(
            service_and_region(host),
            (service.to_string(), region.to_string())
        );
    }

    #[test]
    fn test_service_and_region_is_total() {
        let hosts = [
            "a", "a.b", "a.b.c", "a.b.c.d", "a.b.c.d.e", "a.b.c.d.e.f", ".", "..", "...", "....",
            "s3-", "x.s3-.y.z", "🦀.🦀",
        ];
        for host in hosts {
            let (service, region) = service_and_region(host);
            assert!(!service.is_empty(), "service of {host:?} must not be empty");
            assert!(!region.is_empty(), "region of {host:?} must not be empty");
        }
    }

    #[test_case("johnsmith.s3.amazonaws.com", Some("johnsmith"))]
    #[test_case("johnsmith.s3-eu-west-1.amazonaws.com", Some("johnsmith"))]
    #[test_case("s3.amazonaws.com", None)]
    #[test_case("sqs.us-west-2.amazonaws.com", None)]
    #[test_case("a.b.s3.amazonaws.com", None)]
    fn test_virtual_hosted_bucket(host: &str, expected: Option<&str>) {
        assert_eq!(virtual_hosted_bucket(host), expected);
    }
}
