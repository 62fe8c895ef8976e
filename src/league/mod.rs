pub mod history;
pub mod net_score;
pub mod normalize;
pub mod projection;
pub mod stats;
pub mod types;

pub use history::{net_score_history, GameweekSettlement};
pub use net_score::{net_scores, pairwise_net_scores, settle, MIN_MEMBERS};
pub use normalize::{excluded_members, mark_excluded, normalize_standings};
pub use projection::{project_league, Projection};
pub use stats::{member_form, MemberForm};
pub use types::{Member, MemberHistory, MemberId, NetScoreResult, NetScoreRow, PeriodScore, Standing};
