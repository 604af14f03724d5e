use tracing::{field, info_span, Span};

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Serve;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Bind, Request, Shutdown }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Bind => "bind", Phase::Request => "request", Phase::Shutdown => "shutdown" } }
    fn span(&self) -> Span { match self { Phase::Bind => info_span!("bind"), Phase::Request => info_span!("request", request_id = field::Empty, path = field::Empty), Phase::Shutdown => info_span!("shutdown") } }
}

impl OpMarker for Serve {
    const NAME: &'static str = "serve";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("serve") }
}
