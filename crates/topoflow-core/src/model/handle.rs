//! declare 系操作が返す型付きハンドル

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        ///
        /// 発行元トポロジーのIDを持つ。等価性と順序は位置だけで比較する。
        #[derive(Debug, Clone, Copy)]
        pub struct $name {
            pub(crate) owner: u64,
            pub(crate) index: usize,
        }

        impl $name {
            pub(crate) fn new(owner: u64, index: usize) -> Self {
                Self { owner, index }
            }

            /// 同じ種類のリソース内での位置
            pub fn index(&self) -> usize {
                self.index
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.index == other.index
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.index.hash(state);
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.index.cmp(&other.index)
            }
        }
    };
}

handle!(
    /// 宣言済みネットワークへのハンドル
    NetworkHandle
);
handle!(
    /// 宣言済みサブネットへのハンドル
    SubnetHandle
);
handle!(
    /// 宣言済みインターネットゲートウェイへのハンドル
    GatewayHandle
);
handle!(
    /// 宣言済みルートテーブルへのハンドル
    RouteTableHandle
);
handle!(
    /// 宣言済みルートへのハンドル
    RouteHandle
);
handle!(
    /// 宣言済みルートテーブル関連付けへのハンドル
    AssociationHandle
);
handle!(
    /// 宣言済みファイアウォールポリシー (セキュリティグループ) へのハンドル
    FirewallHandle
);
handle!(
    /// 宣言済みコンピュートインスタンスへのハンドル
    InstanceHandle
);
