//! UseCase: リクエストキュー
//!
//! `Queue` を排他的に保持し、変更のたびに全体のスナップショットを購読者へ流す。
//! 位置を指定する操作は、範囲外なら何もせず `false` を返す。

use tokio::sync::{Mutex, broadcast};

use crate::domain::{Queue, QueueError, QueueItem, QueueItemId};

pub struct QueueEngine {
    queue: Mutex<Queue>,
    events: broadcast::Sender<Queue>,
}

impl QueueEngine {
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self {
            queue: Mutex::new(Queue::new()),
            events,
        }
    }

    /// 変更のたびにキュー全体を受け取る
    pub fn subscribe(&self) -> broadcast::Receiver<Queue> {
        self.events.subscribe()
    }

    fn publish(&self, queue: &Queue) {
        let _ = self.events.send(queue.clone());
    }

    /// 末尾に追加し、追加後の件数を返す
    pub async fn add_to_queue(&self, item: QueueItem) -> usize {
        let mut queue = self.queue.lock().await;
        tracing::info!("Queued '{}' requested by {}", item.title, item.requested_by);
        queue.push(item);
        self.publish(&queue);
        queue.len()
    }

    /// 同じ ID のアイテムが無ければ追加する
    pub async fn try_add_to_queue(&self, item: QueueItem) -> Result<usize, QueueError> {
        let mut queue = self.queue.lock().await;
        if queue.contains(&item.id) {
            return Err(QueueError::DuplicateItem(item.title));
        }
        tracing::info!("Queued '{}' requested by {}", item.title, item.requested_by);
        queue.push(item);
        self.publish(&queue);
        Ok(queue.len())
    }

    pub async fn remove_from_queue(&self, index: usize) -> bool {
        let mut queue = self.queue.lock().await;
        let removed = queue.remove(index);
        self.publish(&queue);
        removed
    }

    /// 1 始まりの位置で取り除き、取り除いたアイテムを返す
    pub async fn remove_at_position(&self, position: usize) -> Result<QueueItem, QueueError> {
        let mut queue = self.queue.lock().await;
        let item = position
            .checked_sub(1)
            .and_then(|index| queue.get(index).cloned().map(|item| (index, item)));
        let Some((index, item)) = item else {
            return Err(QueueError::OutOfRange {
                position,
                len: queue.len(),
            });
        };
        queue.remove(index);
        self.publish(&queue);
        Ok(item)
    }

    /// ID で取り除く。見つからなければ `false`
    pub async fn remove_by_id(&self, id: &QueueItemId) -> bool {
        let mut queue = self.queue.lock().await;
        let removed = match queue.position_of(id) {
            Some(index) => queue.remove(index),
            None => false,
        };
        self.publish(&queue);
        removed
    }

    /// 常に成功する
    pub async fn clear_queue(&self) -> bool {
        let mut queue = self.queue.lock().await;
        queue.clear();
        self.publish(&queue);
        true
    }

    /// 範囲外の位置は「再生中なし」になる
    pub async fn set_currently_playing(&self, index: usize) {
        let mut queue = self.queue.lock().await;
        queue.set_currently_playing(index);
        self.publish(&queue);
    }

    pub async fn set_track_as_queued(&self, index: usize) -> bool {
        let mut queue = self.queue.lock().await;
        let marked = queue.set_track_as_queued(index);
        self.publish(&queue);
        marked
    }

    pub async fn get_queue(&self) -> Queue {
        self.queue.lock().await.clone()
    }

    /// 未キュー・非再生中の先頭アイテム
    pub async fn get_next_track_to_queue(&self) -> Option<(usize, QueueItem)> {
        let queue = self.queue.lock().await;
        queue
            .next_to_queue()
            .map(|(index, item)| (index, item.clone()))
    }

    pub async fn pending_requests_by(&self, user: &str) -> usize {
        self.queue.lock().await.pending_requests_by(user)
    }
}

impl Default for QueueEngine {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::fixtures::item;

    async fn engine_with(items: &[(&str, &str)]) -> QueueEngine {
        let engine = QueueEngine::default();
        for (track, user) in items {
            engine.add_to_queue(item(track, user)).await;
        }
        engine
    }

    #[tokio::test]
    async fn test_every_mutation_publishes_snapshot() {
        // テスト項目: 変更のたびにキュー全体が購読者へ届く
        // given (前提条件):
        let engine = QueueEngine::default();
        let mut events = engine.subscribe();

        // when (操作):
        engine.add_to_queue(item("a", "alice")).await;
        engine.set_currently_playing(0).await;
        engine.remove_from_queue(5).await;

        // then (期待する結果):
        assert_eq!(events.recv().await.unwrap().len(), 1);
        assert_eq!(
            events.recv().await.unwrap().currently_playing_index(),
            Some(0)
        );
        assert_eq!(events.recv().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_items_are_serviced_fifo() {
        // テスト項目: 次にキューへ渡すアイテムは追加順
        // given (前提条件):
        let engine = engine_with(&[("a", "alice"), ("b", "bob"), ("c", "carol")]).await;

        // when (操作):
        let (first, _) = engine.get_next_track_to_queue().await.unwrap();
        engine.set_track_as_queued(first).await;
        let (second, next) = engine.get_next_track_to_queue().await.unwrap();

        // then (期待する結果):
        assert_eq!(first, 0);
        assert_eq!(second, 1);
        assert_eq!(next.track_id, "b");
    }

    #[tokio::test]
    async fn test_removal_is_idempotent_by_id() {
        // テスト項目: 同じ ID の削除は二度目が false
        // given (前提条件):
        let engine = engine_with(&[("a", "alice"), ("b", "bob")]).await;
        let id = QueueItemId::compose("a", "alice");

        // when (操作):
        let first = engine.remove_by_id(&id).await;
        let second = engine.remove_by_id(&id).await;

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(engine.get_queue().await.len(), 1);
    }

    #[tokio::test]
    async fn test_try_add_rejects_duplicate_request() {
        // テスト項目: 同じ人の同じ曲は二重に追加できない
        // given (前提条件):
        let engine = engine_with(&[("a", "alice")]).await;

        // when (操作):
        let duplicate = engine.try_add_to_queue(item("a", "alice")).await;
        let other_user = engine.try_add_to_queue(item("a", "bob")).await;

        // then (期待する結果):
        assert!(matches!(duplicate, Err(QueueError::DuplicateItem(_))));
        assert_eq!(other_user, Ok(2));
    }

    #[tokio::test]
    async fn test_try_add_treats_requester_case_as_same_user() {
        // テスト項目: 名前の大文字小文字だけが違う同じ曲のリクエストは重複になる
        // given (前提条件):
        let engine = engine_with(&[("a", "Alice")]).await;

        // when (操作):
        let duplicate = engine.try_add_to_queue(item("a", "alice")).await;

        // then (期待する結果):
        assert!(matches!(duplicate, Err(QueueError::DuplicateItem(_))));
        assert_eq!(engine.get_queue().await.len(), 1);
        assert_eq!(engine.pending_requests_by("ALICE").await, 1);
    }

    #[tokio::test]
    async fn test_remove_at_position_is_one_based() {
        // テスト項目: 1 始まりの位置で削除でき、範囲外はエラー
        // given (前提条件):
        let engine = engine_with(&[("a", "alice"), ("b", "bob")]).await;

        // when (操作):
        let removed = engine.remove_at_position(2).await;
        let zero = engine.remove_at_position(0).await;
        let beyond = engine.remove_at_position(2).await;

        // then (期待する結果):
        assert_eq!(removed.unwrap().track_id, "b");
        assert_eq!(zero, Err(QueueError::OutOfRange { position: 0, len: 1 }));
        assert_eq!(beyond, Err(QueueError::OutOfRange { position: 2, len: 1 }));
    }

    #[tokio::test]
    async fn test_clear_queue_resets_pointer() {
        // テスト項目: クリア後は空で再生中なし
        // given (前提条件):
        let engine = engine_with(&[("a", "alice")]).await;
        engine.set_currently_playing(0).await;

        // when (操作):
        let cleared = engine.clear_queue().await;

        // then (期待する結果):
        let queue = engine.get_queue().await;
        assert!(cleared);
        assert!(queue.is_empty());
        assert_eq!(queue.currently_playing_index(), None);
    }
}
