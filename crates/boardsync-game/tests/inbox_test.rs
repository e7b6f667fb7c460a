//! Move inbox behaviour against a live board task.

mod common;

use boardsync_core::{Color, constants::START_FEN};
use boardsync_game::{GameError, InterruptToken, MoveInbox, Resolution};
use boardsync_hardware::{BoardEvent, BoardHandle};
use common::{ready_board, touch};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::timeout;

/// Wait until the board has published a move for `color`.
async fn board_move(events: &mut broadcast::Receiver<BoardEvent>, color: Color) {
    loop {
        if let BoardEvent::Move { color: c, .. } = events.recv().await.unwrap() {
            if c == color {
                return;
            }
        }
    }
}

/// Let every task run until idle.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

fn resolved_uci(resolution: Resolution) -> String {
    match resolution {
        Resolution::Move(mv) => mv.uci(),
        other => panic!("expected move, got {other:?}"),
    }
}

async fn setup() -> (
    BoardHandle,
    boardsync_hardware::mock::MockTransportHandle,
    broadcast::Receiver<BoardEvent>,
) {
    let (board, device) = ready_board(START_FEN).await;
    let events = board.subscribe();
    (board, device, events)
}

#[tokio::test(start_paused = true)]
async fn test_outstanding_wait_gets_move() {
    let (board, device, _events) = setup().await;
    let inbox = MoveInbox::spawn(Color::White, &board);

    let completion = inbox.wait().await.unwrap();
    touch(&device, &[("g1", '.'), ("f3", 'N')]).await;

    assert_eq!(resolved_uci(completion.resolved().await.unwrap()), "g1f3");
}

#[tokio::test(start_paused = true)]
async fn test_queued_move_is_redetected() {
    let (board, device, mut events) = setup().await;
    let inbox = MoveInbox::spawn(Color::White, &board);

    touch(&device, &[("e2", '.'), ("e4", 'P')]).await;
    board_move(&mut events, Color::White).await;
    settle().await;

    // The queued copy is dropped; the move is still on the board, so
    // re-detection delivers it again.
    assert_eq!(resolved_uci(inbox.next_move().await.unwrap()), "e2e4");
}

#[tokio::test(start_paused = true)]
async fn test_stale_move_taken_back_is_not_delivered() {
    let (board, device, mut events) = setup().await;
    let inbox = MoveInbox::spawn(Color::White, &board);

    touch(&device, &[("e2", '.'), ("e4", 'P')]).await;
    board_move(&mut events, Color::White).await;
    touch(&device, &[("e4", '.'), ("e2", 'P')]).await;
    settle().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    let result = timeout(Duration::from_secs(5), inbox.next_move()).await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_other_color_is_ignored() {
    let (board, device, _events) = setup().await;
    let inbox = MoveInbox::spawn(Color::Black, &board);

    let completion = inbox.wait().await.unwrap();
    touch(&device, &[("e2", '.'), ("e4", 'P')]).await;

    let result = timeout(Duration::from_secs(5), completion.resolved()).await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_resolves_outstanding_wait() {
    let (board, _device, _events) = setup().await;
    let inbox = MoveInbox::spawn(Color::White, &board);

    let completion = inbox.wait().await.unwrap();
    inbox.interrupt(InterruptToken::new("stop")).await.unwrap();

    assert_eq!(
        completion.resolved().await.unwrap(),
        Resolution::Interrupted(InterruptToken::new("stop"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_held_interrupt_beats_queued_move() {
    let (board, device, mut events) = setup().await;
    let inbox = MoveInbox::spawn(Color::White, &board);

    touch(&device, &[("e2", '.'), ("e4", 'P')]).await;
    board_move(&mut events, Color::White).await;
    inbox.interrupt(InterruptToken::new("takeback")).await.unwrap();
    settle().await;

    assert_eq!(
        inbox.next_move().await.unwrap(),
        Resolution::Interrupted(InterruptToken::new("takeback"))
    );

    // The interrupt is used up; the board move is delivered next.
    assert_eq!(resolved_uci(inbox.next_move().await.unwrap()), "e2e4");
}

#[tokio::test(start_paused = true)]
async fn test_paused_inbox_drops_moves() {
    let (board, device, mut events) = setup().await;
    let inbox = MoveInbox::spawn(Color::White, &board);

    inbox.pause().await.unwrap();
    let completion = inbox.wait().await.unwrap();
    touch(&device, &[("b1", '.'), ("c3", 'N')]).await;
    board_move(&mut events, Color::White).await;
    settle().await;
    inbox.resume().await.unwrap();

    let result = timeout(Duration::from_secs(5), completion.resolved()).await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_new_wait_replaces_old_one() {
    let (board, _device, _events) = setup().await;
    let inbox = MoveInbox::spawn(Color::White, &board);

    let first = inbox.wait().await.unwrap();
    let _second = inbox.wait().await.unwrap();

    assert!(matches!(
        first.resolved().await,
        Err(GameError::InboxClosed {
            color: Color::White
        })
    ));
}
