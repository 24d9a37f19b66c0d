use crate::api::StackApi;
use crate::error::Result;
use crate::reconcile::Plan;
use crate::token::CorrelationToken;
use crate::types::UpdateRequest;

// ---------------------------------------------------------------------------
// Backing-system error classification
// ---------------------------------------------------------------------------

const NO_UPDATES_CODE: &str = "ValidationError";
const NO_UPDATES_MESSAGE: &str = "No updates are to be performed.";

/// Whether an UpdateStack rejection is CloudFormation declining a no-op
/// update. Only this exact code/message pair qualifies; any other
/// `ValidationError` is a real failure.
pub fn is_nothing_to_update(code: Option<&str>, message: Option<&str>) -> bool {
    code == Some(NO_UPDATES_CODE) && message == Some(NO_UPDATES_MESSAGE)
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Submit the plan as an UpdateStack call reusing the current template.
/// Returns the token the call was tagged with.
pub async fn submit<A>(api: &A, stack_name: &str, plan: Plan) -> Result<CorrelationToken>
where
    A: StackApi + ?Sized,
{
    let token = CorrelationToken::generate();
    let request = UpdateRequest {
        stack_name: stack_name.to_string(),
        token: token.clone(),
        parameters: plan.parameters,
        capabilities: plan.capabilities,
        notification_targets: plan.notification_targets,
    };
    api.update_stack(&request).await?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{capture_logs, FakeStack};
    use crate::error::UpdateError;
    use crate::types::StackParameter;

    fn plan() -> Plan {
        Plan {
            parameters: vec![
                StackParameter::use_previous("Env"),
                StackParameter::explicit("ImageTag", "v2"),
            ],
            capabilities: vec!["CAPABILITY_NAMED_IAM".into()],
            notification_targets: vec![],
        }
    }

    #[test]
    fn classification_requires_exact_code_and_message() {
        assert!(is_nothing_to_update(
            Some("ValidationError"),
            Some("No updates are to be performed.")
        ));
        assert!(!is_nothing_to_update(
            Some("ValidationError"),
            Some(
                "Stack:arn:aws:cloudformation:... is in UPDATE_IN_PROGRESS state \
                 and can not be updated."
            )
        ));
        assert!(!is_nothing_to_update(
            Some("Throttling"),
            Some("No updates are to be performed.")
        ));
        assert!(!is_nothing_to_update(None, None));
    }

    #[tokio::test]
    async fn submit_carries_plan_and_fresh_token() {
        let api = FakeStack::default();
        let token = submit(&api, "web", plan()).await.unwrap();

        let updates = api.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        let req = &updates[0];
        assert_eq!(req.stack_name, "web");
        assert_eq!(req.token, token);
        assert_eq!(req.parameters, plan().parameters);
        assert_eq!(req.capabilities, ["CAPABILITY_NAMED_IAM"]);
    }

    #[tokio::test]
    async fn nothing_to_update_propagates_distinctly() {
        let api = FakeStack::default();
        api.fail_update_with(UpdateError::NothingToUpdate);
        let err = submit(&api, "web", plan()).await.unwrap_err();
        assert!(matches!(err, UpdateError::NothingToUpdate));
        assert_eq!(api.update_call_count(), 1);
    }

    #[tokio::test]
    async fn conflict_is_fatal_and_not_retried() {
        let api = FakeStack::default();
        api.fail_update_with(UpdateError::api(
            "UpdateStack",
            "stack is in UPDATE_IN_PROGRESS state and can not be updated",
        ));
        let err = submit(&api, "web", plan()).await.unwrap_err();
        assert!(!err.is_benign());
        assert_eq!(api.update_call_count(), 1);
        assert_eq!(api.update_count(), 0);
    }

    #[tokio::test]
    async fn submit_logs_nothing_on_its_own() {
        let api = FakeStack::default();
        let (_guard, lines) = capture_logs();
        let token = submit(&api, "web", plan()).await.unwrap();
        let lines = lines.lock().unwrap();
        assert!(
            lines.iter().all(|l| !l.contains(token.as_str())),
            "unexpected log lines: {lines:?}"
        );
    }
}
