//! [`StackApi`] over the AWS SDK CloudFormation client.

use async_trait::async_trait;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_cloudformation::primitives::DateTime as SmithyDateTime;
use aws_sdk_cloudformation::types::{Capability, Parameter};
use aws_sdk_cloudformation::Client;
use chrono::{DateTime, Utc};

use crate::api::StackApi;
use crate::error::{Result, UpdateError};
use crate::submit::is_nothing_to_update;
use crate::types::{
    CurrentParameter, EventPage, ParameterValue, ResourceStatus, StackEvent, StackSnapshot,
    UpdateRequest,
};

pub struct CloudFormation {
    client: Client,
}

impl CloudFormation {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the default credential and region chain.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl StackApi for CloudFormation {
    async fn describe_stack(&self, stack_name: &str) -> Result<StackSnapshot> {
        let out = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| UpdateError::api("DescribeStacks", DisplayErrorContext(&e).to_string()))?;

        let [stack] = out.stacks() else {
            return Err(UpdateError::StackCount(out.stacks().len()));
        };
        Ok(StackSnapshot {
            parameters: stack
                .parameters()
                .iter()
                .map(|p| CurrentParameter {
                    key: p.parameter_key().unwrap_or_default().to_string(),
                    value: p.parameter_value().unwrap_or_default().to_string(),
                })
                .collect(),
            capabilities: stack
                .capabilities()
                .iter()
                .map(|c| c.as_str().to_string())
                .collect(),
            notification_targets: stack.notification_arns().to_vec(),
        })
    }

    async fn update_stack(&self, request: &UpdateRequest) -> Result<()> {
        let parameters: Vec<Parameter> = request
            .parameters
            .iter()
            .map(|p| match &p.value {
                ParameterValue::Explicit(v) => Parameter::builder()
                    .parameter_key(&p.key)
                    .parameter_value(v)
                    .build(),
                ParameterValue::UsePrevious => Parameter::builder()
                    .parameter_key(&p.key)
                    .use_previous_value(true)
                    .build(),
            })
            .collect();
        let capabilities: Vec<Capability> = request
            .capabilities
            .iter()
            .map(|c| Capability::from(c.as_str()))
            .collect();

        let result = self
            .client
            .update_stack()
            .stack_name(&request.stack_name)
            .client_request_token(request.token.as_str())
            .use_previous_template(true)
            .set_parameters(Some(parameters))
            .set_capabilities(Some(capabilities))
            .set_notification_arns(Some(request.notification_targets.clone()))
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_nothing_to_update(e.code(), e.message()) => {
                tracing::debug!("update rejected: {}", DisplayErrorContext(&e));
                Err(UpdateError::NothingToUpdate)
            }
            Err(e) => Err(UpdateError::api(
                "UpdateStack",
                DisplayErrorContext(&e).to_string(),
            )),
        }
    }

    async fn describe_stack_events(
        &self,
        stack_name: &str,
        next_token: Option<String>,
    ) -> Result<EventPage> {
        let out = self
            .client
            .describe_stack_events()
            .stack_name(stack_name)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| {
                UpdateError::api("DescribeStackEvents", DisplayErrorContext(&e).to_string())
            })?;

        Ok(EventPage {
            events: out
                .stack_events()
                .iter()
                .map(|e| StackEvent {
                    timestamp: e.timestamp().and_then(to_chrono),
                    resource_type: e.resource_type().unwrap_or_default().to_string(),
                    logical_resource_id: e.logical_resource_id().unwrap_or_default().to_string(),
                    resource_status: e
                        .resource_status()
                        .map(|s| ResourceStatus::from(s.as_str()))
                        .unwrap_or_else(|| ResourceStatus::Other(String::new())),
                    status_reason: e.resource_status_reason().unwrap_or_default().to_string(),
                    correlation_token: e.client_request_token().map(str::to_string),
                })
                .collect(),
            next_token: out.next_token().map(str::to_string),
        })
    }
}

fn to_chrono(ts: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}
