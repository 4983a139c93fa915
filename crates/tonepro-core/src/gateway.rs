//! Analysis gateway contract.

use std::cell::RefCell;
use std::future::Future;

use tonepro_common::AnalysisResult;

use crate::controller::{AnalysisRequest, Controller, Resolution};
use crate::platform::ControllerHost;

/// Asynchronous text analysis.
///
/// Never fails past this boundary: transport, provider and parse errors all
/// come back as [`AnalysisResult::Failed`].
pub trait AnalysisGateway {
    fn analyze(&self, text: &str) -> impl Future<Output = AnalysisResult>;
}

/// Send `request` through `gateway` and apply the result.
///
/// The controller is only borrowed after the gateway answers, so input and
/// focus events keep being handled while the request is outstanding.
pub async fn run_analysis<H, G>(
    controller: &RefCell<Controller<H>>,
    gateway: &G,
    request: AnalysisRequest,
) -> Resolution
where
    H: ControllerHost,
    G: AnalysisGateway,
{
    let result = gateway.analyze(&request.text).await;
    controller.borrow_mut().complete(&request, result)
}
