pub const ONE_GARMENT_PER_GENERATION: &str = "Only one garment can be changed per generation.";
pub const ONE_SWAP_AT_A_TIME: &str = "One swap at a time. Change top or bottom, then generate.";
pub const ADD_FULL_BODY_PHOTO: &str = "Add a full-body photo to continue.";
pub const ADD_GARMENT: &str = "Add a top or bottom to generate.";
pub const NOT_FULL_BODY: &str = "Not full body. Step back and get head-to-shoes.";
pub const CAMERA_UNAVAILABLE: &str = "Camera is not available on this device.";
pub const SAVED: &str = "Saved.";
pub const SAVE_PERMISSION_NEEDED: &str = "Couldn’t save. Photos permission needed.";
pub const SAVE_FAILED: &str = "Couldn’t save. Try again.";
pub const PHOTO_UNREADABLE: &str = "Couldn’t open that photo.";
