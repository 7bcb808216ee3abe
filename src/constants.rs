//! Application-wide constants
//!
//! JSON field names, preference type tags and persisted key suffixes live
//! here so the factory, the entities and the stores agree on one spelling.

/// Root document fields
pub mod document {
    /// Array of child preference definitions (required)
    pub const ITEMS: &str = "items";

    /// Store namespace for every preference in the document
    pub const NAMESPACE: &str = "prefs";

    /// Write defaults into the store immediately after loading
    pub const PRE_INIT: &str = "preinit";

    /// Namespace used when the document does not name one
    pub const DEFAULT_NAMESPACE: &str = "prefs";
}

/// Fields shared by every preference item
pub mod field {
    pub const TYPE: &str = "type";
    pub const KEY: &str = "key";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const DEPENDENCY: &str = "if";

    pub const CHECKED: &str = "checked";
    pub const SELECTED_DESCRIPTION: &str = "selected_description";
    pub const UNSELECTED_DESCRIPTION: &str = "unselected_description";

    /// String array reference for list options
    pub const LIST_OPTIONS: &str = "items";
    pub const LIST_DEFAULT: &str = "default";

    pub const APP_NAME: &str = "app_name";
    pub const APP_PACKAGE: &str = "app_package";
    pub const APP_ACTIVITY: &str = "app_activity";

    pub const COLOR: &str = "color";
    pub const SWATCH: &str = "swatch";
    pub const SWATCH_POSITION: &str = "swatch_position";
    pub const ALPHA_ENABLED: &str = "alpha_enabled";
    pub const COLORS: &str = "colors";

    pub const DISMISSIBLE: &str = "dismissible";
    pub const DISMISSED: &str = "dismissed";

    pub const SEEKBAR_MIN: &str = "min";
    pub const SEEKBAR_MAX: &str = "max";
    pub const SEEKBAR_STEP_SIZE: &str = "step_size";
    pub const SEEKBAR_VALUE: &str = "value";
    pub const SEEKBAR_SELECTED_STEP: &str = "selected_step";
}

/// Values of the `type` discriminator
pub mod kind {
    pub const BOOLEAN: &str = "boolean";
    pub const LIST_SINGLE: &str = "list_single";
    pub const LIST_APPS: &str = "list_apps";
    pub const COLOR: &str = "color";
    pub const COLOR_GROUP: &str = "color_group";
    pub const SECTION: &str = "section";
    pub const SIMPLE: &str = "simple";
    pub const MESSAGE: &str = "message";
    pub const SEEKBAR_INT: &str = "seekbar_int";
    pub const SEEKBAR_FLOAT: &str = "seekbar_float";
    pub const GROUP: &str = "group";
}

/// Suffixes appended to a preference key for secondary persisted fields
pub mod suffix {
    pub const LIST_DISPLAY: &str = "_display";
    pub const SWATCH: &str = "_swatch";
    pub const SWATCH_POSITION: &str = "_swatch_position";
    pub const SEEKBAR_VALUE: &str = "_value";
    pub const APP_PACKAGE: &str = "_package";
    pub const APP_NICE_NAME: &str = "_nicename";
    pub const DISMISSED: &str = "_dismissed";
}

/// Color values
pub mod color {
    /// Swatch index meaning "not picked from a swatch"
    pub const NO_SWATCH: i32 = -1;

    /// Alpha channel forced onto 6-digit hex colors
    pub const OPAQUE_ALPHA: u32 = 0xFF00_0000;
}

/// Seekbar defaults used when a definition leaves a field out
pub mod seekbar {
    pub const INT_MIN: i32 = 0;
    pub const INT_MAX: i32 = 2;
    pub const INT_STEP_SIZE: i32 = 1;

    pub const FLOAT_MIN: f32 = 0.0;
    pub const FLOAT_MAX: f32 = 2.0;
    pub const FLOAT_STEP_SIZE: f32 = 1.0;
}

/// File locations
pub mod config {
    /// Directory name under the platform config dir
    pub const APP_DIR: &str = "prefs-tree";

    /// Extension of per-namespace store files
    pub const STORE_EXTENSION: &str = "json";
}
