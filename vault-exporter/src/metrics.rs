//! Fixed metric schema exported for a Vault node.
//!
//! Every descriptor is a `'static` value built at compile time; the collector
//! only ever hands out references into [`DESCRIPTORS`] (or [`BUILD_INFO`]).

use vault_exporter_common::BuildInfo;

/// Namespace prepended to every exported metric name.
pub const NAMESPACE: &str = "vault";

/// Static description of one exported metric family.
#[derive(Debug, PartialEq, Eq)]
pub struct Descriptor {
    /// Fully qualified metric name.
    pub name: &'static str,
    /// `# HELP` text.
    pub help: &'static str,
    /// Label names, in the order sample label values are stored.
    pub label_names: &'static [&'static str],
}

/// Was the last query of Vault successful.
pub static UP: Descriptor = Descriptor {
    name: "vault_up",
    help: "Was the last query of Vault successful.",
    label_names: &[],
};

/// Is the Vault initialised.
pub static INITIALIZED: Descriptor = Descriptor {
    name: "vault_initialized",
    help: "Is the Vault initialised (according to this node).",
    label_names: &[],
};

/// Is the Vault node sealed.
pub static SEALED: Descriptor = Descriptor {
    name: "vault_sealed",
    help: "Is the Vault node sealed.",
    label_names: &[],
};

/// Is this Vault node in standby.
pub static STANDBY: Descriptor = Descriptor {
    name: "vault_standby",
    help: "Is this Vault node in standby.",
    label_names: &[],
};

/// Version and cluster identity of this Vault node.
pub static INFO: Descriptor = Descriptor {
    name: "vault_info",
    help: "Version of this Vault node.",
    label_names: &["version", "cluster_name", "cluster_id"],
};

/// Every descriptor the Vault collector can emit, in emission order.
pub static DESCRIPTORS: [&Descriptor; 5] = [&UP, &INITIALIZED, &SEALED, &STANDBY, &INFO];

/// Build metadata of the exporter itself.
pub static BUILD_INFO: Descriptor = Descriptor {
    name: "vault_exporter_build_info",
    help: "A metric with a constant '1' value labeled by version, revision, branch and rustversion from which vault_exporter was built.",
    label_names: &["version", "revision", "branch", "rustversion"],
};

/// One gauge sample ready for exposition.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub descriptor: &'static Descriptor,
    /// Label values matching `descriptor.label_names` position by position.
    pub label_values: Vec<String>,
    pub value: f64,
}

impl Sample {
    /// Create a sample without labels.
    pub fn gauge(descriptor: &'static Descriptor, value: f64) -> Self {
        debug_assert!(descriptor.label_names.is_empty());
        Self {
            descriptor,
            label_values: Vec::new(),
            value,
        }
    }

    /// Create a sample with label values.
    ///
    /// `label_values` must have one entry per label name of `descriptor`.
    pub fn labeled(descriptor: &'static Descriptor, label_values: Vec<String>, value: f64) -> Self {
        debug_assert_eq!(descriptor.label_names.len(), label_values.len());
        Self {
            descriptor,
            label_values,
            value,
        }
    }

    /// Metric name of this sample.
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    /// Label pairs in descriptor order.
    pub fn labels(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.descriptor
            .label_names
            .iter()
            .copied()
            .zip(self.label_values.iter().map(String::as_str))
    }
}

/// Constant `vault_exporter_build_info` sample for `info`.
pub fn build_info_sample(info: &BuildInfo) -> Sample {
    Sample::labeled(
        &BUILD_INFO,
        vec![
            info.version.to_string(),
            info.revision.to_string(),
            info.branch.to_string(),
            info.rustc.to_string(),
        ],
        1.0,
    )
}

/// Map a boolean flag to a gauge value.
pub fn bool_to_gauge(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}
