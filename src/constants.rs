//! Shared timeline constants such as scale factors, zoom bounds and default sizes.
//! Every value here is also the default of the matching `EditorSettings` field.

/// Pixels per second at zoom 1.0.
pub const PIXELS_PER_SECOND: f64 = 100.0;
/// Frame rate used for trim windows and transition durations.
pub const FPS: f64 = 30.0;

pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 4.0;
pub const DEFAULT_ZOOM: f64 = 1.0;
/// Multiplicative zoom step for zoom in/out.
pub const ZOOM_STEP: f64 = 1.5;

/// Gap (in pixels) under which two clips count as touching for transitions.
pub const SNAP_DISTANCE_PX: f64 = 10.0;

pub const HISTORY_CAPACITY: usize = 100;

pub const DEFAULT_TRACK_COUNT: usize = 4;
pub const DEFAULT_TIMELINE_WIDTH_PX: f64 = 2000.0;
pub const TIMELINE_EXPANSION_THRESHOLD_PX: f64 = 200.0;
pub const TIMELINE_EXPANSION_AMOUNT_PX: f64 = 1000.0;

pub const DEFAULT_TEXT_WIDTH_PX: f64 = 80.0;
pub const DEFAULT_IMAGE_WIDTH_PX: f64 = 100.0;
pub const DEFAULT_MEDIA_WIDTH_PX: f64 = 150.0;
pub const MIN_DROP_WIDTH_PX: f64 = 20.0;

/// Initial player-space offset of a dropped clip.
pub const DEFAULT_PLAYER_OFFSET: f64 = 100.0;
pub const DEFAULT_TEXT_FONT_SIZE: f64 = 48.0;
pub const DEFAULT_TEXT_CHARS: usize = 10;
pub const MIN_TEXT_PLAYER_WIDTH: f64 = 200.0;
pub const MIN_TEXT_PLAYER_HEIGHT: f64 = 80.0;

/// Natural height reported for a composite clip.
pub const GROUP_MEDIA_HEIGHT: f64 = 60.0;

/// Slack allowed when checking a trim window against the source length.
/// Split points round to whole frames, so a piece can display up to half a frame more.
pub const TRIM_TOLERANCE_FRAMES: f64 = 0.5;

/// Tolerance for pixel comparisons after floating-point rescaling.
pub const GEOMETRY_EPSILON: f64 = 1e-6;
