use serde::{Deserialize, Serialize};

/// Which kinds of facts the Java provider emits.
///
/// Everything is on by default; the two method filters are off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub methods: bool,
    pub method_calls: bool,
    pub class_fields: bool,
    pub inheritance: bool,
    pub imports: bool,
    pub interface_implementations: bool,
    pub control_flow: bool,
    /// Skip methods not declared `public`
    pub only_public_methods: bool,
    /// Skip calls to private methods of the calling class
    pub omit_private_method_calls: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            methods: true,
            method_calls: true,
            class_fields: true,
            inheritance: true,
            imports: true,
            interface_implementations: true,
            control_flow: true,
            only_public_methods: false,
            omit_private_method_calls: false,
        }
    }
}

impl ExtractionConfig {
    #[must_use]
    pub const fn methods(mut self, enabled: bool) -> Self {
        self.methods = enabled;
        self
    }

    #[must_use]
    pub const fn method_calls(mut self, enabled: bool) -> Self {
        self.method_calls = enabled;
        self
    }

    #[must_use]
    pub const fn class_fields(mut self, enabled: bool) -> Self {
        self.class_fields = enabled;
        self
    }

    #[must_use]
    pub const fn inheritance(mut self, enabled: bool) -> Self {
        self.inheritance = enabled;
        self
    }

    #[must_use]
    pub const fn imports(mut self, enabled: bool) -> Self {
        self.imports = enabled;
        self
    }

    #[must_use]
    pub const fn interface_implementations(mut self, enabled: bool) -> Self {
        self.interface_implementations = enabled;
        self
    }

    #[must_use]
    pub const fn control_flow(mut self, enabled: bool) -> Self {
        self.control_flow = enabled;
        self
    }

    #[must_use]
    pub const fn only_public_methods(mut self, enabled: bool) -> Self {
        self.only_public_methods = enabled;
        self
    }

    #[must_use]
    pub const fn omit_private_method_calls(mut self, enabled: bool) -> Self {
        self.omit_private_method_calls = enabled;
        self
    }
}
