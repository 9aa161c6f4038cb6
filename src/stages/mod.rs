pub mod stage0_normalize;
pub mod stage1_detect;
pub mod stage2_apply;
pub mod stage3_render;

pub use stage0_normalize::*;
pub use stage1_detect::*;
pub use stage2_apply::*;
pub use stage3_render::*;
