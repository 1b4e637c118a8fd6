//! Per-platform manifest rewrites.
//!
//! Every transform takes a document by value and returns the rewritten one.
//! Reading and writing the file is the caller's job.

use super::ManifestDocument;
use crate::config::Platform;
use crate::errors::ManifestError;
use serde_json::json;
use tracing::warn;

/// The background script every platform starts from.
pub const GENERIC_ENTRY_POINT: &str = "background/chromeExtension.js";

/// Edge bridge script preloaded into the background context.
pub const BACKGROUND_BRIDGE: &str = "backgroundScriptsAPIBridge.js";

/// Edge bridge script preloaded into content scripts.
pub const CONTENT_BRIDGE: &str = "contentScriptsAPIBridge.js";

/// A pure manifest rewrite.
pub type ManifestTransform = fn(ManifestDocument) -> Result<ManifestDocument, ManifestError>;

/// Returns the rewrite for `platform`.
#[must_use]
pub fn transform_for(platform: Platform) -> ManifestTransform {
    match platform {
        Platform::Chrome => chrome,
        Platform::Firefox => firefox,
        Platform::Edge => edge,
    }
}

/// Chrome uses the generic manifest unchanged.
///
/// # Errors
///
/// Never fails.
pub fn chrome(doc: ManifestDocument) -> Result<ManifestDocument, ManifestError> {
    Ok(doc)
}

/// Points the background scripts at the Firefox entry point.
///
/// # Errors
///
/// Returns an error if `background.scripts` is missing.
pub fn firefox(mut doc: ManifestDocument) -> Result<ManifestDocument, ManifestError> {
    swap_entry_point(&mut doc, Platform::Firefox)?;
    Ok(doc)
}

/// Adds the Edge preload bridges, makes the background persistent, points the
/// background scripts at the Edge entry point and shows the action button.
///
/// # Errors
///
/// Returns an error if `background` or `background.scripts` is missing.
pub fn edge(mut doc: ManifestDocument) -> Result<ManifestDocument, ManifestError> {
    doc.set(
        "-ms-preload",
        json!({
            "backgroundScript": BACKGROUND_BRIDGE,
            "contentScript": CONTENT_BRIDGE,
        }),
    );
    doc.set_background_persistent(true)?;
    swap_entry_point(&mut doc, Platform::Edge)?;
    doc.set(
        "browser_specific_settings",
        json!({
            "edge": {
                "browser_action_next_to_addressbar": true
            }
        }),
    );
    Ok(doc)
}

fn swap_entry_point(doc: &mut ManifestDocument, platform: Platform) -> Result<(), ManifestError> {
    let replaced = doc.replace_background_script(GENERIC_ENTRY_POINT, platform.entry_point())?;
    if !replaced {
        warn!(
            platform = %platform,
            entry_point = GENERIC_ENTRY_POINT,
            "Generic entry point not found in background.scripts; manifest left unchanged"
        );
    }
    Ok(())
}
