//! Registered-factor metadata.

use serde::{Deserialize, Serialize};

use crate::strategy::Method;

/// One registered authentication factor.
///
/// Read-only data describing how a factor was enrolled (e.g. the phone
/// number an SMS code goes to, the device a push lands on). The
/// verification core consumes it for display and selection; it never
/// mutates enrollments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    id: String,
    methods: Vec<Method>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_name: Option<String>,
}

impl Enrollment {
    /// Create an enrollment covering the given methods.
    pub fn new(id: impl Into<String>, methods: Vec<Method>) -> Self {
        Self {
            id: id.into(),
            methods,
            phone_number: None,
            device_name: None,
        }
    }

    /// Attach the phone number SMS codes are delivered to.
    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    /// Attach the name of the device push notifications land on.
    pub fn with_device_name(mut self, device_name: impl Into<String>) -> Self {
        self.device_name = Some(device_name.into());
        self
    }

    /// Enrollment identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Methods this enrollment covers.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Whether this enrollment covers `method`.
    pub fn supports(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }

    /// Phone number for SMS delivery, if enrolled.
    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    /// Device name for push delivery, if enrolled.
    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }
}
