// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! `k3d_cluster` schema and data model.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::k3d::config_transform::{SimpleConfig, SimpleExposureOpts};
use crate::schema::{
    Attribute, AttributeType, IpValidator, LengthBetween, PortValidator, RegexMatches,
    RequiresReplace, Schema, StaticDefault, UseStateForUnknown,
};
use crate::value::AttrValue;

pub const CLUSTER_TYPE_NAME: &str = "k3d_cluster";

pub const DEFAULT_SERVERS: i64 = 1;
pub const DEFAULT_AGENTS: i64 = 0;
pub const DEFAULT_IMAGE: &str = "latest";
pub const DEFAULT_API_HOST_IP: &str = "127.0.0.1";
pub const DEFAULT_API_HOST_PORT: i64 = 6550;

pub const API_HOST_PATTERN: &str = "^[a-z0-9]+$";

/// Plan and state of a `k3d_cluster`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterData {
    pub name: AttrValue<String>,
    pub servers: AttrValue<i64>,
    pub agents: AttrValue<i64>,
    pub k8s_api_host: AttrValue<String>,
    pub k8s_api_host_ip: AttrValue<String>,
    pub k8s_api_host_port: AttrValue<i64>,
    pub image: AttrValue<String>,
    pub image_sha: AttrValue<String>,
    pub network: AttrValue<String>,
    pub id: AttrValue<String>,
}

impl ClusterData {
    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// Cluster name from `name`, falling back to `id` for imported state.
    pub fn cluster_name(&self) -> Option<&str> {
        self.name
            .as_known()
            .or_else(|| self.id.as_known())
            .map(String::as_str)
            .filter(|n| !n.is_empty())
    }

    /// Fill unset configurable attributes with their defaults. Explicit
    /// values, including zero and empty, are kept.
    pub fn with_defaults(self) -> Self {
        Self {
            servers: self.servers.or_default_value(DEFAULT_SERVERS),
            agents: self.agents.or_default_value(DEFAULT_AGENTS),
            image: self.image.or_default_value(DEFAULT_IMAGE.to_string()),
            k8s_api_host_ip: self
                .k8s_api_host_ip
                .or_default_value(DEFAULT_API_HOST_IP.to_string()),
            k8s_api_host_port: self.k8s_api_host_port.or_default_value(DEFAULT_API_HOST_PORT),
            ..self
        }
    }

    /// Drop any unknowns left over from the plan.
    pub fn into_state(self) -> Self {
        Self {
            name: self.name.unknown_as_null(),
            servers: self.servers.unknown_as_null(),
            agents: self.agents.unknown_as_null(),
            k8s_api_host: self.k8s_api_host.unknown_as_null(),
            k8s_api_host_ip: self.k8s_api_host_ip.unknown_as_null(),
            k8s_api_host_port: self.k8s_api_host_port.unknown_as_null(),
            image: self.image.unknown_as_null(),
            image_sha: self.image_sha.unknown_as_null(),
            network: self.network.unknown_as_null(),
            id: self.id.unknown_as_null(),
        }
    }

    /// k3d simple config for this cluster. Call on defaulted data.
    pub fn simple_config(&self, name: &str, config: &ProviderConfig) -> SimpleConfig {
        let mut simple = SimpleConfig::new(name);
        simple.servers = self.servers.known_or(DEFAULT_SERVERS);
        simple.agents = self.agents.known_or(DEFAULT_AGENTS);
        simple.image = self.image.known_or(DEFAULT_IMAGE.to_string());
        simple.network = self.network.known_or(String::new());
        simple.expose_api = SimpleExposureOpts {
            host: self.k8s_api_host.known_or(String::new()),
            host_ip: self.k8s_api_host_ip.known_or(String::new()),
            host_port: self
                .k8s_api_host_port
                .as_known()
                .map(|p| p.to_string())
                .unwrap_or_default(),
        };
        simple.options.k3d.wait = config.wait;
        simple.options.k3d.timeout = config.create_timeout();
        // The provider writes kubeconfigs itself.
        simple.options.kubeconfig.update_default_kubeconfig = false;
        simple.options.kubeconfig.switch_current_context = false;
        simple
    }
}

fn api_host_regex() -> Regex {
    static API_HOST_REGEX: OnceLock<Regex> = OnceLock::new();
    API_HOST_REGEX
        .get_or_init(|| Regex::new(API_HOST_PATTERN).expect("API host pattern is a valid regex"))
        .clone()
}

pub fn cluster_schema() -> Schema {
    let k8s_api_host = Attribute::new(AttributeType::String)
        .optional()
        .describe("The hostname to serve the Kubernetes APIs with")
        .validator(LengthBetween::new(10, 256))
        .validator(RegexMatches::new(
            api_host_regex(),
            "must contain only lowercase alphanumeric characters",
        ));

    Schema::new("K3D Cluster")
        .attribute(
            "name",
            Attribute::new(AttributeType::String)
                .required()
                .describe("Name that you want to give to your cluster (will still be prefixed with `k3d-`)")
                .modifier(RequiresReplace),
        )
        .attribute(
            "servers",
            Attribute::new(AttributeType::Int64)
                .optional()
                .computed()
                .describe("Number of servers to create")
                .modifier(StaticDefault::int64(DEFAULT_SERVERS))
                .modifier(RequiresReplace),
        )
        .attribute(
            "agents",
            Attribute::new(AttributeType::Int64)
                .optional()
                .computed()
                .describe("Number of agents to create")
                .modifier(StaticDefault::int64(DEFAULT_AGENTS))
                .modifier(RequiresReplace),
        )
        .attribute(
            "k8s_api_host",
            k8s_api_host
                .modifier(UseStateForUnknown)
                .modifier(RequiresReplace),
        )
        .attribute(
            "k8s_api_host_ip",
            Attribute::new(AttributeType::String)
                .optional()
                .computed()
                .describe("The IP to bind the Kubernetes API")
                .validator(IpValidator)
                .modifier(StaticDefault::string(DEFAULT_API_HOST_IP))
                .modifier(UseStateForUnknown)
                .modifier(RequiresReplace),
        )
        .attribute(
            "k8s_api_host_port",
            Attribute::new(AttributeType::Int64)
                .optional()
                .computed()
                .describe("The port to bind the Kubernetes API")
                .validator(PortValidator)
                .modifier(StaticDefault::int64(DEFAULT_API_HOST_PORT))
                .modifier(UseStateForUnknown)
                .modifier(RequiresReplace),
        )
        .attribute(
            "image",
            Attribute::new(AttributeType::String)
                .optional()
                .computed()
                .describe("Name of the K3s node image")
                .modifier(StaticDefault::string(DEFAULT_IMAGE))
                .modifier(UseStateForUnknown)
                .modifier(RequiresReplace),
        )
        .attribute(
            "image_sha",
            Attribute::new(AttributeType::String)
                .computed()
                .describe("SHA of the docker image that was used")
                .modifier(UseStateForUnknown),
        )
        .attribute(
            "network",
            Attribute::new(AttributeType::String)
                .optional()
                .computed()
                .describe("Name of the network the K3s nodes get attached to. If unset, a new network will be created.")
                .modifier(UseStateForUnknown)
                .modifier(RequiresReplace),
        )
        .attribute(
            "id",
            Attribute::new(AttributeType::String)
                .computed()
                .describe("The ID of the cluster"),
        )
}
