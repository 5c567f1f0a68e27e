use crate::{CritiqueError, FollowUpResponse, SubmitResponse};
use opentelemetry::trace::Status;
use std::{future::Future, time::Instant};
use tracing::{info_span, Span};
use tracing_futures::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

#[derive(Clone, Copy)]
pub(crate) enum PipelineSpanMethod {
    Submit,
    FollowUp,
}

impl PipelineSpanMethod {
    fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::FollowUp => "follow_up",
        }
    }
}

pub(crate) struct PipelineSpan {
    span: Span,
    started_at: Instant,
}

impl PipelineSpan {
    pub fn new(method: PipelineSpanMethod) -> Self {
        let span = match method {
            PipelineSpanMethod::Submit => info_span!("proofit.submit"),
            PipelineSpanMethod::FollowUp => info_span!("proofit.follow_up"),
        };
        span.set_attribute("proofit.method", method.as_str());

        Self {
            span,
            started_at: Instant::now(),
        }
    }

    pub fn span(&self) -> Span {
        self.span.clone()
    }

    pub fn on_submit(&self, response: &SubmitResponse) {
        self.span
            .set_attribute("proofit.category", response.category.as_str());
        self.span.set_attribute("proofit.cache_hit", response.cached);
        self.span.set_attribute(
            "proofit.outcome",
            if response.outcome.as_critique().is_some() {
                "critique"
            } else {
                "text"
            },
        );
        if !response.warnings.is_empty() {
            self.span.set_attribute(
                "proofit.warnings",
                i64::try_from(response.warnings.len()).unwrap_or(i64::MAX),
            );
        }
    }

    pub fn on_follow_up(&self, response: &FollowUpResponse) {
        self.span
            .set_attribute("proofit.follow_up.local", response.local);
        if !response.warnings.is_empty() {
            self.span.set_attribute(
                "proofit.warnings",
                i64::try_from(response.warnings.len()).unwrap_or(i64::MAX),
            );
        }
    }

    pub fn on_error(&self, error: &CritiqueError) {
        self.span
            .set_attribute("exception.message", error.to_string());
        self.span.set_attribute("error.type", error.kind());
        self.span.set_attribute(
            "http.response.status_code",
            i64::from(error.http_status().as_u16()),
        );
        self.span.set_status(Status::error(error.to_string()));
    }

    pub fn on_end(&self) {
        self.span.set_attribute(
            "proofit.duration_seconds",
            self.started_at.elapsed().as_secs_f64(),
        );
    }
}

pub(crate) async fn trace_submit<Fut>(future: Fut) -> Result<SubmitResponse, CritiqueError>
where
    Fut: Future<Output = Result<SubmitResponse, CritiqueError>> + Send,
{
    let span = PipelineSpan::new(PipelineSpanMethod::Submit);
    let result = future.instrument(span.span()).await;

    match &result {
        Ok(response) => span.on_submit(response),
        Err(error) => span.on_error(error),
    }

    span.on_end();
    result
}

pub(crate) async fn trace_follow_up<Fut>(future: Fut) -> Result<FollowUpResponse, CritiqueError>
where
    Fut: Future<Output = Result<FollowUpResponse, CritiqueError>> + Send,
{
    let span = PipelineSpan::new(PipelineSpanMethod::FollowUp);
    let result = future.instrument(span.span()).await;

    match &result {
        Ok(response) => span.on_follow_up(response),
        Err(error) => span.on_error(error),
    }

    span.on_end();
    result
}
