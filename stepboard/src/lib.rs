//! Step-contest leaderboard client: contest discovery, paginated rankings
//! with a pinned "my rank" row, ended-contest history and prize claims.

pub mod api;
pub mod background;
pub mod backend;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod handoff;
pub mod models;
pub mod paging;
pub mod registry;
pub mod reward;
pub mod session;
pub mod state;
pub mod template;
pub mod util;
pub mod viewer;


pub use api::ApiClient;
pub use backend::{Backend, RankQuery};
pub use engine::{Leaderboard, LoadOutcome};
pub use error::{Error, Result};
pub use geometry::{FixedProbe, Geometry, GeometryProbe};
pub use handoff::{Handoff, HandoffSlot};
pub use session::{Authenticator, CredentialStore, Session, StaticCode};
pub use state::BoardState;
pub use template::render_board;
