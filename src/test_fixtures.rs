// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared builders for unit tests.

use k8s_openapi::api::networking::v1::{
    Ingress, IngressLoadBalancerIngress, IngressLoadBalancerStatus, IngressRule, IngressSpec,
    IngressStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Build an Ingress with the given UID, host rules and load-balancer IPs.
pub fn ingress(uid: &str, hosts: &[&str], ips: &[&str]) -> Ingress {
    Ingress {
        metadata: ObjectMeta {
            name: Some(format!("ingress-{uid}")),
            namespace: Some("default".to_string()),
            uid: Some(uid.to_string()),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: Some(
                hosts
                    .iter()
                    .map(|host| IngressRule {
                        host: Some((*host).to_string()),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }),
        status: Some(IngressStatus {
            load_balancer: Some(IngressLoadBalancerStatus {
                ingress: Some(
                    ips.iter()
                        .map(|ip| IngressLoadBalancerIngress {
                            ip: Some((*ip).to_string()),
                            ..Default::default()
                        })
                        .collect(),
                ),
            }),
        }),
    }
}
