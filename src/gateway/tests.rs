use super::mock::{MockGateway, PROJECT_ID};
use super::*;
use crate::model::remote::AuthorRef;

fn payload(iid: u64) -> IssuePayload {
    IssuePayload {
        iid,
        title: format!("Issue {iid}"),
        description: String::new(),
        assignee_id: None,
        milestone_id: None,
        created_at: None,
        labels: vec![],
        author: AuthorRef {
            username: None,
            name: "Unknown".into(),
        },
    }
}

#[tokio::test]
async fn dry_run_forwards_reads() {
    let mock = MockGateway::new().with_issue(3, "opened");
    let gateway = DryRun::new(mock.clone());

    let issues = gateway.list_issues(PROJECT_ID, 0).await.unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(mock.calls(), vec!["list_issues page=0"]);
}

#[tokio::test]
async fn dry_run_acknowledges_writes_without_sending() {
    let mock = MockGateway::new().with_issue(3, "opened");
    let gateway = DryRun::new(mock.clone());

    let created = gateway
        .create_issue(PROJECT_ID, &payload(4), Some("alice"))
        .await
        .unwrap();
    assert_eq!(
        created,
        Written::Skipped(NoOp {
            action: "create_issue".into(),
            target: "42#4".into(),
        })
    );

    let updated = gateway
        .update_issue(PROJECT_ID, &payload(3), StateEvent::Close)
        .await
        .unwrap();
    match updated {
        Written::Skipped(ack) => assert_eq!(ack.action, "update_issue(close)"),
        Written::Applied(_) => panic!("dry run must not apply writes"),
    }

    let deleted = gateway.delete_note(PROJECT_ID, 3, 9).await.unwrap();
    match deleted {
        Written::Skipped(ack) => assert_eq!(ack.target, "42#3/notes/9"),
        Written::Applied(()) => panic!("dry run must not apply writes"),
    }

    assert!(mock.calls().is_empty());
    assert_eq!(mock.state.lock().unwrap().issues.len(), 1);
}

#[tokio::test]
async fn mock_reports_sudo_per_call() {
    let mock = MockGateway::new();
    let note = NotePayload {
        body: "hi".into(),
        created_at: None,
    };
    mock.create_issue(PROJECT_ID, &payload(1), None).await.unwrap();
    mock.create_note(PROJECT_ID, 1, &note, Some("bob")).await.unwrap();
    mock.create_note(PROJECT_ID, 1, &note, None).await.unwrap();

    assert_eq!(
        mock.calls(),
        vec![
            "create_issue 1 sudo=-",
            "create_note 1 sudo=bob",
            "create_note 1 sudo=-",
        ]
    );
}
