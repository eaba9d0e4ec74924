//! Error taxonomy for the crawl core.
//!
//! Per the error handling design: interface failures, comparator failures,
//! template failures, and configuration failures are distinct variants so
//! callers can apply the right recovery policy (retry, skip, or hard fail).

use thiserror::Error;

/// Result alias used throughout `demodocus-core`.
pub type Result<T> = std::result::Result<T, Error>;

/// The kinds of `InterfaceAccess` failure the core distinguishes for retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterfaceErrorKind {
    /// The operation exceeded its bounded timeout.
    #[error("interface operation timed out after {0:?}")]
    Timeout(std::time::Duration),
    /// The targeted element is no longer present in the DOM.
    #[error("element is stale: {0}")]
    StaleElement(String),
    /// The targeted element exists but cannot currently be interacted with.
    #[error("element not interactable: {0}")]
    NotInteractable(String),
    /// An unexpected native dialog blocked the operation.
    #[error("unexpected alert blocked the operation")]
    UnexpectedAlert,
    /// The underlying driver/process crashed or is unreachable.
    #[error("interface driver is unavailable: {0}")]
    DriverUnavailable(String),
    /// The entry point could not be loaded at all.
    #[error("failed to load entry point: {0}")]
    LoadFailed(String),
}

impl InterfaceErrorKind {
    /// Transient errors are worth a bounded retry with state-replay; fatal
    /// ones require tearing down and recreating the access (§7).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            InterfaceErrorKind::Timeout(_)
                | InterfaceErrorKind::StaleElement(_)
                | InterfaceErrorKind::NotInteractable(_)
                | InterfaceErrorKind::UnexpectedAlert
        )
    }
}

/// Top-level error type for `demodocus-core`.
#[derive(Debug, Error)]
pub enum Error {
    /// An `InterfaceAccess` operation failed.
    #[error("interface error: {0}")]
    Interface(#[from] InterfaceErrorKind),

    /// A comparator raised during pipeline evaluation; callers must treat
    /// the compared states as different.
    #[error("comparator '{0}' failed")]
    Comparator(String),

    /// The HTML template engine failed to merge or match a DOM.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// A configuration precondition was violated before the crawl started.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Failure modes the template engine's match/merge walk can raise (§4.2).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// Two corresponding nodes have different tag names.
    #[error("tag mismatch at {xpath}: template has '{expected}', dom has '{found}'")]
    TagMismatch {
        /// xpath of the disagreeing node.
        xpath: String,
        /// Tag name recorded in the template.
        expected: String,
        /// Tag name found in the new DOM.
        found: String,
    },
    /// A required (non-unstable) attribute is missing from one side.
    #[error("required attribute '{attr}' missing at {xpath}")]
    MissingAttribute {
        /// xpath of the disagreeing node.
        xpath: String,
        /// Missing attribute name.
        attr: String,
    },
    /// A required (non-unstable) attribute differs in value.
    #[error("attribute '{attr}' differs at {xpath}: '{expected}' vs '{found}'")]
    AttributeValueDiffers {
        /// xpath of the disagreeing node.
        xpath: String,
        /// Attribute name.
        attr: String,
        /// Value recorded in the template.
        expected: String,
        /// Value found in the new DOM.
        found: String,
    },
    /// Required (non-unstable) text content differs.
    #[error("text differs at {xpath}: '{expected}' vs '{found}'")]
    TextDiffers {
        /// xpath of the disagreeing node.
        xpath: String,
        /// Text recorded in the template.
        expected: String,
        /// Text found in the new DOM.
        found: String,
    },
    /// A child on one side has no corresponding element on the other and
    /// neither is marked unstable.
    #[error("no correspondence for child at {xpath}")]
    NoCorrespondence {
        /// xpath of the unmatched child.
        xpath: String,
    },
}
