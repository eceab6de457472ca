//! Full board lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port and drives every façade operation
//! over real HTTP through `UreqTransport`, so request building, transport,
//! parsing and error normalization are checked together against the actual
//! routes.

use std::time::Duration;

use glo_core::{
    BoardUpdate, CardUpdate, Color, ColumnUpdate, Credentials, Endpoint, Endpoints, FailureKind,
    GloBoardApi, IdRef, LabelUpdate, NewCard, Query, Scheme, UreqTransport,
};
use tokio::sync::oneshot;

async fn start() -> GloBoardApi {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(mock_server::run(listener));

    GloBoardApi::with_endpoints(
        UreqTransport::with_timeout(Duration::from_secs(5)),
        Endpoints::all(Endpoint::new(Scheme::Http, "127.0.0.1", port)),
    )
}

fn token() -> Credentials {
    Credentials::with_access_token("integration-token")
}

#[tokio::test(flavor = "multi_thread")]
async fn board_lifecycle() {
    let api = start().await;
    let creds = token();

    // Step 1: no boards yet.
    let boards = api.get_boards(&creds, None).unwrap().await.unwrap();
    assert!(boards.is_empty(), "expected no boards");

    // Step 2: board and columns.
    let board = api.create_board(&creds, "Integration").unwrap().await.unwrap();
    assert_eq!(board.name, "Integration");
    let b = board.id.clone();

    let todo = api.create_column(&creds, &b, "Todo", None).unwrap().await.unwrap();
    let done = api
        .create_column(&creds, &b, "Done", Some(1))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(todo.position, Some(0));
    assert_eq!(done.position, Some(1));

    let renamed = api
        .edit_column(
            &creds,
            &b,
            &done.id,
            &ColumnUpdate {
                name: Some("Shipped".to_string()),
                ..ColumnUpdate::default()
            },
        )
        .unwrap()
        .await
        .unwrap();
    assert_eq!(renamed.name, "Shipped");

    let query = Query::fields(["name", "columns"]);
    let fetched = api.get_board(&creds, &b, Some(&query)).unwrap().await.unwrap();
    assert_eq!(fetched.columns.len(), 2);

    let edited = api
        .edit_board(
            &creds,
            &b,
            &BoardUpdate {
                name: Some("Renamed".to_string()),
            },
        )
        .unwrap()
        .await
        .unwrap();
    assert_eq!(edited.name, "Renamed");

    // Step 3: cards.
    let card = api
        .create_card(&creds, &b, &todo.id, &NewCard::new("Write tests"))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(card.column_id.as_deref(), Some(todo.id.as_str()));
    let k = card.id.clone();

    let batch = api
        .create_batch_of_cards(
            &creds,
            &b,
            &[
                NewCard::new("A").in_column(&done.id),
                NewCard::new("B").in_column(&done.id),
            ],
            false,
        )
        .unwrap()
        .await
        .unwrap();
    assert_eq!(batch.cards.len(), 2);

    let all = api.get_cards_of_board(&creds, &b, None).unwrap().await.unwrap();
    assert_eq!(all.len(), 3);
    let shipped = api
        .get_cards_of_column(&creds, &b, &done.id, None)
        .unwrap()
        .await
        .unwrap();
    assert_eq!(shipped.len(), 2);

    // Step 4: labels.
    let label = api
        .create_label(&creds, &b, "bug", Color::rgb(200, 0, 0))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(label.color, Some(Color::rgb(200, 0, 0)));
    let label = api
        .edit_label(
            &creds,
            &b,
            &label.id,
            &LabelUpdate {
                name: Some("defect".to_string()),
                ..LabelUpdate::default()
            },
        )
        .unwrap()
        .await
        .unwrap();
    assert_eq!(label.name, "defect");

    let moved = api
        .edit_card(
            &creds,
            &b,
            &k,
            &CardUpdate {
                column_id: Some(done.id.clone()),
                labels: Some(vec![IdRef::new(&label.id)]),
                ..CardUpdate::default()
            },
        )
        .unwrap()
        .await
        .unwrap();
    assert_eq!(moved.column_id.as_deref(), Some(done.id.as_str()));
    assert_eq!(moved.labels, vec![IdRef::new(&label.id)]);

    // Step 5: comments.
    let comment = api
        .create_comment(&creds, &b, &k, "looks good")
        .unwrap()
        .await
        .unwrap();
    let comment = api
        .edit_comment(&creds, &b, &k, &comment.id, "looks great")
        .unwrap()
        .await
        .unwrap();
    assert_eq!(comment.text, "looks great");
    let comments = api
        .get_comments_of_card(&creds, &b, &k, None)
        .unwrap()
        .await
        .unwrap();
    assert_eq!(comments.len(), 1);
    let card = api.get_card(&creds, &b, &k, None).unwrap().await.unwrap();
    assert_eq!(card.comment_count, Some(1));

    // Step 6: tear everything down.
    api.delete_comment(&creds, &b, &k, &comment.id)
        .unwrap()
        .await
        .unwrap();
    api.delete_label(&creds, &b, &label.id).unwrap().await.unwrap();
    api.delete_card(&creds, &b, &k).unwrap().await.unwrap();
    api.delete_column(&creds, &b, &todo.id).unwrap().await.unwrap();
    api.delete_board(&creds, &b).unwrap().await.unwrap();

    let err = api.get_board(&creds, &b, None).unwrap().await.unwrap_err();
    assert_eq!(err.status_code(), Some(404));
    assert_eq!(err.message(), "Board not found");

    let boards = api.get_boards(&creds, None).unwrap().await.unwrap();
    assert!(boards.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_token_is_normalized_401() {
    let api = start().await;
    let err = api
        .get_user(&Credentials::new(), None)
        .unwrap()
        .await
        .unwrap_err();

    assert_eq!(err.name(), "ApiError");
    assert_eq!(err.status_code(), Some(401));
    assert_eq!(err.message(), "Unauthorized");
    assert_eq!(err.kind(), FailureKind::Status);
}

#[tokio::test(flavor = "multi_thread")]
async fn callback_mode_delivers_once() {
    let api = start().await;
    let (tx, rx) = oneshot::channel();

    api.get_user(&token(), None).unwrap().callback(move |outcome| {
        let _ = tx.send(outcome);
    });

    let user = rx.await.unwrap().unwrap();
    assert_eq!(user.username.as_deref(), Some("glo-mock"));
}

#[tokio::test(flavor = "multi_thread")]
async fn oauth_grant_then_use_token() {
    let api = start().await;
    let mut creds = Credentials::new();
    creds.set_client_id("client");
    creds.set_client_secret("secret");

    let granted = api
        .authorization_code_grant(&creds, "code-from-redirect")
        .unwrap()
        .await
        .unwrap();
    assert_eq!(granted.token_type, "bearer");

    creds.set_access_token(granted.access_token);
    let user = api.get_user(&creds, None).unwrap().await.unwrap();
    assert_eq!(user.id, "mock-user");
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let api = GloBoardApi::with_endpoints(
        UreqTransport::with_timeout(Duration::from_secs(2)),
        Endpoints::all(Endpoint::new(Scheme::Http, "127.0.0.1", port)),
    );

    let err = api.get_boards(&token(), None).unwrap().await.unwrap_err();
    assert_eq!(err.status_code(), None);
    assert_eq!(err.kind(), FailureKind::Transport);
}
