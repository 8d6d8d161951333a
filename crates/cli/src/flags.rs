use clap::ValueEnum;

#[derive(Copy, Clone, ValueEnum)]
pub(crate) enum OrderingFlag {
    Strict,
    Keyed,
}

impl OrderingFlag {
    pub(crate) const fn as_domain(self) -> calography_graph::OrderingMode {
        match self {
            OrderingFlag::Strict => calography_graph::OrderingMode::Strict,
            OrderingFlag::Keyed => calography_graph::OrderingMode::Keyed,
        }
    }
}
