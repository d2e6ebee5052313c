//! TopoFlow Core
//!
//! 単一クラウドデプロイメント向けの宣言的ネットワークトポロジーモデル
//!
//! [`Topology`] は `declare_*` API でプログラムから構築するか、
//! [`parse_kdl_file`] で KDL ファイルから構築する。各宣言はそれ以前の宣言に
//! 対して検証されるため、完成したトポロジーは非循環グラフとなり、サブネットは
//! 必ずネットワークの範囲内に収まり互いに重複しない。
//!
//! ```text
//! network ─┬─ subnet ──────────┬─ association ── route-table ── route ── gateway
//!          ├─ gateway          └─ instance ── firewall
//!          ├─ route-table
//!          └─ firewall
//! ```

pub mod cidr;
pub mod error;
pub mod fleet;
pub mod model;
pub mod parser;
pub mod redis;
pub mod topology;

// 再エクスポート
pub use error::{Result, TopologyError};
pub use fleet::{InstanceTemplate, declare_fleet};
pub use model::*;
pub use parser::{parse_kdl_file, parse_kdl_string};
pub use redis::redis_topology;
pub use topology::{ResourceHandle, Topology};
