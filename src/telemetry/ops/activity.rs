use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Activity;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Request, Decode, Select }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Request => "request", Phase::Decode => "decode", Phase::Select => "select" } }
    fn span(&self) -> Span { match self { Phase::Request => info_span!("request"), Phase::Decode => info_span!("decode"), Phase::Select => info_span!("select") } }
}

impl OpMarker for Activity {
    const NAME: &'static str = "activity";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("activity") }
}
