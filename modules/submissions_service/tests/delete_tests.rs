//! Integration tests for single and bulk deletion

use serde_json::json;
use submissions_service::contract::*;
use submissions_service::domain::messages;
use submissions_service::domain::*;

mod common;
use common::*;

const SUBMITTED: &str = "2024-03-01 10:00:00";

#[tokio::test]
async fn test_single_delete_removes_row_files_and_selection() {
    print_test_header(
        "test_single_delete_removes_row_files_and_selection",
        &[
            "Deleting one submission removes its files, notifies, refreshes",
            "stats and drops it from the user's selection",
        ],
    );

    let env = TestEnv::new().await;
    let doomed = env.seed(&[("attachment", "cv.pdf")], true, SUBMITTED).await;
    let kept = env.seed(&[("first_name", "Ann")], true, SUBMITTED).await;
    env.selection.select(FORM_ID, doomed);
    env.selection.select(FORM_ID, kept);

    let outcome = env
        .service
        .delete_submission(FORM_ID, VIEW_ID, doomed)
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.message, messages::SUBMISSION_AND_FILES_DELETED);
    assert_eq!(outcome.deleted_ids, vec![doomed]);
    assert_eq!(env.stored_ids().await, vec![kept]);
    assert_eq!(env.files.deleted(), vec!["cv.pdf".to_string()]);
    assert_eq!(env.notifier.events(), vec![(SubmissionEvent::OnDelete, doomed)]);
    assert_eq!(env.selection.selected(FORM_ID), vec![kept]);
    assert_eq!(env.stats.form_stats(FORM_ID).map(|s| s.submission_count), Some(1));
    assert_eq!(
        env.stats.view_stats(FORM_ID, VIEW_ID).map(|s| s.submission_count),
        Some(1)
    );
}

#[tokio::test]
async fn test_single_delete_without_file_cleanup() {
    print_test_header(
        "test_single_delete_without_file_cleanup",
        &["Forms that keep files on delete never touch file storage"],
    );

    let env = TestEnv::new().await;
    let mut form = sample_form();
    form.auto_delete_files_on_submission_delete = false;
    env.catalog.add_form(form, sample_fields());
    let submission_id = env.seed(&[("attachment", "cv.pdf")], true, SUBMITTED).await;

    let outcome = env
        .service
        .delete_submission(FORM_ID, VIEW_ID, submission_id)
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.message, messages::SUBMISSION_DELETED);
    assert!(env.files.deleted().is_empty());
    assert!(env.stored_ids().await.is_empty());
}

#[tokio::test]
async fn test_unavailable_file_storage_still_deletes_row() {
    print_test_header(
        "test_unavailable_file_storage_still_deletes_row",
        &["File problems are reported but never keep the row alive"],
    );

    let env = TestEnv::new().await;
    env.files.go_offline();
    let submission_id = env.seed(&[("attachment", "cv.pdf")], true, SUBMITTED).await;

    let outcome = env
        .service
        .delete_submission(FORM_ID, VIEW_ID, submission_id)
        .await
        .unwrap();

    assert!(!outcome.success);
    assert!(outcome.message.starts_with(messages::SUBMISSION_DELETED_WITH_PROBLEMS));
    assert!(outcome.message.contains("cv.pdf: storage offline"));
    assert!(env.stored_ids().await.is_empty());
}

#[tokio::test]
async fn test_bulk_delete_itemizes_file_problems() {
    print_test_header(
        "test_bulk_delete_itemizes_file_problems",
        &["Each file that could not be removed gets its own line"],
    );

    let env = TestEnv::new().await;
    let a = env.seed(&[("attachment", "a.pdf")], true, SUBMITTED).await;
    let b = env.seed(&[("attachment", "b.png")], true, SUBMITTED).await;
    let c = env.seed(&[("attachment", "c.txt")], true, SUBMITTED).await;
    env.files.fail_on("b.png");
    env.selection.select(FORM_ID, c);

    let outcome = env
        .service
        .delete_submissions(FORM_ID, VIEW_ID, DeleteTarget::Ids(vec![a, b, a]), &SearchSpec::default())
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.deleted_ids, vec![a, b]);
    assert_eq!(
        outcome.message,
        format!(
            "{}\n{}",
            messages::SUBMISSIONS_DELETED_WITH_PROBLEMS,
            messages::file_problem_line("b.png", "permission denied")
        )
    );
    assert_eq!(env.files.deleted(), vec!["a.pdf".to_string()]);
    assert_eq!(env.stored_ids().await, vec![c]);
    assert!(env.selection.selected(FORM_ID).is_empty());
    assert_eq!(
        env.notifier.events(),
        vec![(SubmissionEvent::OnDelete, a), (SubmissionEvent::OnDelete, b)]
    );
}

#[tokio::test]
async fn test_delete_all_resolves_current_search_minus_omitted() {
    print_test_header(
        "test_delete_all_resolves_current_search_minus_omitted",
        &[
            "`All` deletes every finalized row the caller's search matches",
            "except the omitted ids; drafts and non-matches survive",
        ],
    );

    let env = TestEnv::new().await;
    let ann = env.seed(&[("first_name", "Ann"), ("colors", "red")], true, SUBMITTED).await;
    let dan = env.seed(&[("first_name", "Dan"), ("colors", "blue")], true, SUBMITTED).await;
    let bob = env.seed(&[("first_name", "Bob"), ("colors", "red")], true, SUBMITTED).await;
    let stan = env.seed(&[("first_name", "Stan"), ("colors", "red")], false, SUBMITTED).await;

    let search = SearchSpec {
        search_field: Some("all".into()),
        search_date: None,
        search_keyword: Some("red".into()),
    };
    let outcome = env
        .service
        .delete_submissions(FORM_ID, VIEW_ID, DeleteTarget::All { omit: vec![bob] }, &search)
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.deleted_ids, vec![ann]);
    assert_eq!(outcome.message, messages::SUBMISSION_AND_FILES_DELETED);
    assert_eq!(env.stored_ids().await, vec![dan, bob, stan]);
}

#[tokio::test]
async fn test_empty_delete_changes_nothing() {
    print_test_header(
        "test_empty_delete_changes_nothing",
        &["Nothing to delete means nothing happens; the outcome is unsuccessful and silent"],
    );

    let env = TestEnv::new().await;
    let kept = env.seed(&[("colors", "blue")], true, SUBMITTED).await;

    let outcome = env
        .service
        .delete_submissions(FORM_ID, VIEW_ID, DeleteTarget::Ids(Vec::new()), &SearchSpec::default())
        .await
        .unwrap();
    assert!(!outcome.success);
    assert!(outcome.message.is_empty());
    assert!(outcome.deleted_ids.is_empty());

    let nothing_red = SearchSpec {
        search_field: Some("colors".into()),
        search_date: None,
        search_keyword: Some("red".into()),
    };
    let outcome = env
        .service
        .delete_submissions(FORM_ID, VIEW_ID, DeleteTarget::All { omit: Vec::new() }, &nothing_red)
        .await
        .unwrap();
    assert!(!outcome.success);
    assert!(outcome.deleted_ids.is_empty());

    assert_eq!(env.stored_ids().await, vec![kept]);
    assert!(env.notifier.events().is_empty());
}

#[tokio::test]
async fn test_delete_all_with_everything_omitted() {
    print_test_header(
        "test_delete_all_with_everything_omitted",
        &["Omitting every matching id leaves the table untouched"],
    );

    let env = TestEnv::new().await;
    let a = env.seed(&[("first_name", "Ann")], true, SUBMITTED).await;
    let b = env.seed(&[("first_name", "Bob")], true, SUBMITTED).await;

    let outcome = env
        .service
        .delete_submissions(
            FORM_ID,
            VIEW_ID,
            DeleteTarget::All { omit: vec![b, a] },
            &SearchSpec::default(),
        )
        .await
        .unwrap();

    assert!(!outcome.success);
    assert!(outcome.message.is_empty());
    assert!(outcome.deleted_ids.is_empty());
    assert_eq!(env.stored_ids().await, vec![a, b]);
    assert!(env.files.deleted().is_empty());
    assert!(env.notifier.events().is_empty());
}

#[tokio::test]
async fn test_delete_all_on_view_without_searchable_fields_ignores_keyword() {
    print_test_header(
        "test_delete_all_on_view_without_searchable_fields_ignores_keyword",
        &[
            "A view that exposes no searchable field adds no keyword clause, so",
            "`All` resolves to every finalized row of the view",
        ],
    );

    const AMOUNTS_VIEW_ID: ViewId = 12;
    let env = TestEnv::new().await;
    env.catalog.add_view(
        View {
            view_id: AMOUNTS_VIEW_ID,
            form_id: FORM_ID,
            view_name: "Amounts".into(),
        },
        vec![ViewField {
            view_id: AMOUNTS_VIEW_ID,
            field_id: AMOUNT,
            list_order: 1,
            is_editable: true,
            is_searchable: false,
            is_sortable: true,
            title_override: None,
        }],
    );
    let ann = env.seed(&[("first_name", "Ann"), ("amount", "5")], true, SUBMITTED).await;
    let bob = env.seed(&[("first_name", "Bob"), ("amount", "100")], true, SUBMITTED).await;
    let draft = env.seed(&[("first_name", "Ann")], false, SUBMITTED).await;

    let search = SearchSpec {
        search_field: Some("all".into()),
        search_date: None,
        search_keyword: Some("Ann".into()),
    };
    let outcome = env
        .service
        .delete_submissions(FORM_ID, AMOUNTS_VIEW_ID, DeleteTarget::All { omit: Vec::new() }, &search)
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.deleted_ids, vec![ann, bob]);
    assert_eq!(env.stored_ids().await, vec![draft]);
}

#[tokio::test]
async fn test_start_hook_can_narrow_bulk_delete() {
    print_test_header(
        "test_start_hook_can_narrow_bulk_delete",
        &["A start stage may rewrite the id list before anything is removed"],
    );

    let env = TestEnv::new().await;
    let a = env.seed(&[], true, SUBMITTED).await;
    let b = env.seed(&[], true, SUBMITTED).await;
    env.hooks.register(HookStage::new(
        "protect-latest",
        HookPoint::DeleteSubmissions,
        HookPhase::Start,
        &["submission_ids"],
        move |_context| {
            let mut patch = HookContext::new();
            patch.insert("submission_ids".into(), json!([a]));
            Ok(patch)
        },
    ));

    let outcome = env
        .service
        .delete_submissions(FORM_ID, VIEW_ID, DeleteTarget::Ids(vec![a, b]), &SearchSpec::default())
        .await
        .unwrap();

    assert_eq!(outcome.deleted_ids, vec![a]);
    assert_eq!(env.stored_ids().await, vec![b]);
}

#[tokio::test]
async fn test_end_hook_cannot_write_undeclared_keys() {
    print_test_header(
        "test_end_hook_cannot_write_undeclared_keys",
        &["Keys a stage did not declare writable are ignored"],
    );

    let env = TestEnv::new().await;
    let submission_id = env.seed(&[], true, SUBMITTED).await;
    env.hooks.register(HookStage::new(
        "rewrite-message",
        HookPoint::DeleteSubmission,
        HookPhase::End,
        &["message"],
        |_context| {
            let mut patch = HookContext::new();
            patch.insert("message".into(), json!("Gone."));
            patch.insert("success".into(), json!(false));
            Ok(patch)
        },
    ));

    let outcome = env
        .service
        .delete_submission(FORM_ID, VIEW_ID, submission_id)
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.message, "Gone.");
}

#[tokio::test]
async fn test_delete_on_unknown_form_fails() {
    print_test_header(
        "test_delete_on_unknown_form_fails",
        &["Deleting from a form the catalog does not know is FormNotFound"],
    );

    let env = TestEnv::new().await;
    let result = env.service.delete_submission(404, VIEW_ID, 1).await;
    assert!(matches!(result, Err(SubmissionsError::FormNotFound { form_id: 404 })));

    let result = env
        .service
        .delete_submissions(404, VIEW_ID, DeleteTarget::Ids(vec![1]), &SearchSpec::default())
        .await;
    assert!(matches!(result, Err(SubmissionsError::FormNotFound { .. })));
}
