pub mod chart;
pub mod notification;
pub mod refresh;
pub mod signals;

pub use chart::*;
pub use notification::*;
pub use refresh::*;
pub use signals::*;
