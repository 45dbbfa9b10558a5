//! Constants used throughout the application

/// Number of landmarks fed to the PnP solve
pub const NUM_PNP_LANDMARKS: usize = 6;

/// Number of points produced by the facial landmark network
pub const NUM_FACIAL_LANDMARKS: usize = 68;

/// Indices of the PnP landmarks in the iBUG 68-point layout:
/// nose tip, chin, left eye outer corner, right eye outer corner,
/// left mouth corner, right mouth corner
pub const PNP_LANDMARK_INDICES: [usize; NUM_PNP_LANDMARKS] = [30, 8, 36, 45, 48, 54];

/// 3-D anthropometric reference model in millimeters, nose tip at the origin.
/// Index-for-index correspondence with `PNP_LANDMARK_INDICES`.
pub const REFERENCE_MODEL_POINTS: [[f32; 3]; NUM_PNP_LANDMARKS] = [
    [0.0, 0.0, 0.0],          // Nose tip
    [0.0, -330.0, -65.0],     // Chin
    [-225.0, 170.0, -135.0],  // Left eye outer corner
    [225.0, 170.0, -135.0],   // Right eye outer corner
    [-150.0, -150.0, -125.0], // Left mouth corner
    [150.0, -150.0, -125.0],  // Right mouth corner
];

/// Camera matrix center factor
pub const CAMERA_CENTER_FACTOR: f64 = 2.0;

/// Number of pose samples captured before calibration locks
pub const DEFAULT_CALIBRATION_SAMPLES: usize = 10;

/// Minimum horizontal displacement from neutral to register a move
pub const DEFAULT_X_OFFSET: f64 = 100.0;

/// Minimum vertical displacement from neutral to register a move
pub const DEFAULT_Y_OFFSET: f64 = 75.0;

/// Horizontal motion must exceed this multiple of the vertical component
/// before it wins the tie-break, so diagonal tilts don't read as horizontal
pub const HORIZONTAL_DOMINANCE_RATIO: f64 = 1.5;

/// Default window size for optional translation smoothing
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// Face box expansion factor applied before landmark detection
pub const DEFAULT_BOX_EXPANSION: f32 = 0.2;

/// Default face detector confidence threshold
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Default IOU threshold for non-maximum suppression
pub const DEFAULT_NMS_THRESHOLD: f32 = 0.4;

/// Minimum pixel spread of a landmark configuration before the solve is
/// considered degenerate
pub const MIN_LANDMARK_SPREAD: f32 = 1.0;
