//! Markup selectors and bot markers for the targeted chat UI.
//!
//! These are tied to one specific, versioned rendering of the remote UI.
//! The class-name hashes change when the vendor redeploys; when a run starts
//! failing with element-not-found errors, start here.

/// One rendered message in the channel timeline.
pub const MESSAGE_LIST_ITEM: &str = ".messageListItem__5126c";

/// Full-size image link inside a finished message.
pub const IMAGE_LINK: &str = ".originalLink_af017a";

/// First entry of the slash-command suggestion menu.
pub const COMMAND_SUGGESTION: &str = "#autocomplete-0 > .base__13533";

/// The "pill" prompt input injected after a slash command is selected.
pub const PROMPT_PILL: &str = "span.optionPillValue__1464f";

/// Marker present once the generated grid exposes its upscale buttons.
pub const UPSCALE_MARKER: &str = "U1";

/// The four ordinal upscale options attached to a generated grid.
pub const UPSCALE_OPTIONS: [&str; 4] = ["U1", "U2", "U3", "U4"];

/// Label of the high-fidelity upscale control.
pub const SUBTLE_UPSCALE_LABEL: &str = "Upscale (Subtle)";

/// Markers the bot emits on the finished upscaled-image message. Both must
/// be present to distinguish it from intermediate status messages.
pub const VARIED_MARKER: &str = "Vary (Strong)";
pub const WEB_VIEW_MARKER: &str = "Web";
