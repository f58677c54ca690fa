use std::collections::BTreeMap;
use std::path::Path;

use bootsplash_core::{ActionReply, ActionRequest, HelperError};
use bootsplash_installer::{
    install_theme, rebuild_boot_image, remove_theme, set_active_theme, themes, HelperLayout,
};
use tracing::{debug, info, warn};

/// Receives the one-shot install notification before the final reply.
pub type ProgressSink<'a> = &'a mut dyn FnMut(&BTreeMap<String, String>);

/// Run exactly one operation pipeline and turn its result into the reply.
/// Validation failures return before any component is touched.
pub fn dispatch(
    request: &ActionRequest,
    layout: &HelperLayout,
    progress: ProgressSink<'_>,
) -> ActionReply {
    match request {
        ActionRequest::Save { theme } => save(theme, layout),
        ActionRequest::Install { themearchive } => install(themearchive, layout, progress),
        ActionRequest::Uninstall { theme } => uninstall(theme, layout),
    }
}

fn require(value: &str, name: &'static str) -> Result<(), HelperError> {
    if value.is_empty() {
        return Err(HelperError::EmptyArgument { name });
    }
    Ok(())
}

fn reply_for(error: &HelperError) -> ActionReply {
    warn!(error = %error.description(), "helper action failed");
    ActionReply::from_error(error)
}

fn save(theme: &str, layout: &HelperLayout) -> ActionReply {
    if let Err(err) = require(theme, "theme") {
        return reply_for(&err);
    }
    info!(theme = %theme, "switching active theme");

    if let Err(err) = set_active_theme(layout, theme) {
        return reply_for(&err);
    }

    // The config write stays in place when the rebuild fails afterwards:
    // the two steps are a documented non-transactional sequence.
    match rebuild_boot_image(layout) {
        Ok(()) => ActionReply::success(),
        Err(err) => reply_for(&err),
    }
}

fn install(themearchive: &str, layout: &HelperLayout, progress: ProgressSink<'_>) -> ActionReply {
    if let Err(err) = require(themearchive, "themearchive") {
        return reply_for(&err);
    }
    info!(archive = %themearchive, "installing theme archive");

    match install_theme(Path::new(themearchive), layout) {
        Ok(installed) => {
            let mut data = BTreeMap::new();
            data.insert("plugin".to_string(), installed.theme_name.clone());
            data.insert(
                "path".to_string(),
                installed.install_path.display().to_string(),
            );
            progress(&data);
            info!(theme = %installed.theme_name, "theme installed");
            ActionReply::success_with_data(data)
        }
        Err(err) => reply_for(&err),
    }
}

fn uninstall(theme: &str, layout: &HelperLayout) -> ActionReply {
    if let Err(err) = require(theme, "theme") {
        return reply_for(&err);
    }
    info!(theme = %theme, "uninstalling theme");

    match remove_theme(layout, theme) {
        Ok(()) => ActionReply::success(),
        Err(err) => {
            if matches!(err, HelperError::NotFound { .. }) {
                if let Ok(installed) = themes(layout) {
                    debug!(?installed, "requested theme is not installed");
                }
            }
            reply_for(&err)
        }
    }
}
