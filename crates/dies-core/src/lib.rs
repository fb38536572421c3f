mod angle;
mod ball;
mod bot_id;
mod bot_state;
mod debug;
mod dies_instant;
mod game_state;
mod geom;
mod referee;
mod robot_info;
mod settings;
mod trajectory;
mod vision;
mod world_frame;

pub use angle::*;
pub use ball::*;
pub use bot_id::*;
pub use bot_state::*;
pub use debug::*;
pub use dies_instant::*;
pub use game_state::*;
pub use geom::*;
pub use referee::*;
pub use robot_info::*;
pub use settings::*;
pub use trajectory::*;
pub use vision::*;
pub use world_frame::*;

/// 2D vector in field coordinates, in mm (or mm/s for velocities).
pub type Vector2 = nalgebra::Vector2<f64>;
/// 3D vector in field coordinates, in mm (or mm/s for velocities).
pub type Vector3 = nalgebra::Vector3<f64>;
