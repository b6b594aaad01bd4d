mod panels;

pub(super) use panels::{PoolList, show_top_bar};
