//! Mock generation service for deterministic testing.

use crate::pipeline::UNITS_PER_WEEK;
use crate::service::{GenerationService, ServiceError, UnitStream};
use async_trait::async_trait;
use pf_protocol::plan_models::{Item, ItemDetail, ItemState, Unit};
use pf_protocol::session_models::GenerationConfig;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

/// A scripted [`GenerationService`] implementation.
///
/// Produces `week_count * 7` units of `items_per_unit` item stubs each.
/// Fault injection:
/// - `failing_after_units(n)`: the plan stream yields a transport error
///   after `n` units, once; the next call streams the full plan again
///   (the engine is expected to suppress the duplicates).
/// - `with_failing_item(unit, item)`: detail generation for that item
///   fails with an item-scoped error every time.
/// - `with_detail_transport_faults(n)`: the next `n` detail calls fail
///   with a transport error, whichever items they land on.
/// - `with_delay(ms)`: every detail call sleeps first, to exercise
///   fan-out and cancellation paths.
pub struct MockGenerationService {
    items_per_unit: usize,
    fail_after_units: Mutex<Option<usize>>,
    failing_items: HashSet<(usize, usize)>,
    detail_transport_faults: Mutex<usize>,
    detail_delay: Option<Duration>,
}

impl MockGenerationService {
    /// A service that always succeeds, with the given number of items
    /// per unit.
    pub fn succeeding(items_per_unit: usize) -> Self {
        Self {
            items_per_unit,
            fail_after_units: Mutex::new(None),
            failing_items: HashSet::new(),
            detail_transport_faults: Mutex::new(0),
            detail_delay: None,
        }
    }

    /// A service whose first plan stream fails after `n` units.
    pub fn failing_after_units(items_per_unit: usize, n: usize) -> Self {
        Self {
            fail_after_units: Mutex::new(Some(n)),
            ..Self::succeeding(items_per_unit)
        }
    }

    /// Make detail generation fail permanently for one item position.
    pub fn with_failing_item(mut self, unit_index: usize, item_index: usize) -> Self {
        self.failing_items.insert((unit_index, item_index));
        self
    }

    /// Make the next `n` detail calls fail with a transport error.
    pub fn with_detail_transport_faults(self, n: usize) -> Self {
        Self {
            detail_transport_faults: Mutex::new(n),
            ..self
        }
    }

    /// Delay every detail call by the given number of milliseconds.
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.detail_delay = Some(Duration::from_millis(delay_ms));
        self
    }

    fn build_unit(index: usize, items_per_unit: usize, regenerated: bool) -> Unit {
        let items = (0..items_per_unit)
            .map(|item_index| {
                let title = if regenerated {
                    format!("Meal {} (alternative)", item_index + 1)
                } else {
                    format!("Meal {}", item_index + 1)
                };
                Item::stub(item_index, title)
            })
            .collect();

        Unit {
            index,
            label: format!("Day {}", index + 1),
            items,
        }
    }
}

#[async_trait]
impl GenerationService for MockGenerationService {
    async fn generate_plan(&self, config: &GenerationConfig) -> Result<UnitStream, ServiceError> {
        let total = config.week_count as usize * UNITS_PER_WEEK;
        let items_per_unit = self.items_per_unit;

        // One-shot fault: taken here so a retry streams cleanly.
        let fail_after = self
            .fail_after_units
            .lock()
            .map_err(|_| ServiceError::Transport("mock state poisoned".to_string()))?
            .take();

        let stream = async_stream::stream! {
            for index in 0..total {
                if fail_after == Some(index) {
                    yield Err(ServiceError::Transport(
                        "connection reset mid-stream".to_string(),
                    ));
                    return;
                }
                yield Ok(MockGenerationService::build_unit(index, items_per_unit, false));
            }
        };

        Ok(Box::pin(stream))
    }

    async fn regenerate_unit(
        &self,
        _config: &GenerationConfig,
        unit_index: usize,
    ) -> Result<Unit, ServiceError> {
        Ok(Self::build_unit(unit_index, self.items_per_unit, true))
    }

    async fn generate_details(&self, unit: &Unit, item: &Item) -> Result<Item, ServiceError> {
        {
            let mut faults = self
                .detail_transport_faults
                .lock()
                .map_err(|_| ServiceError::Transport("mock state poisoned".to_string()))?;
            if *faults > 0 {
                *faults -= 1;
                return Err(ServiceError::Transport(
                    "connection reset during detail call".to_string(),
                ));
            }
        }

        if let Some(delay) = self.detail_delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_items.contains(&(unit.index, item.index)) {
            return Err(ServiceError::Item(format!(
                "detail generation failed for '{}'",
                item.title
            )));
        }

        Ok(Item {
            index: item.index,
            title: item.title.clone(),
            state: ItemState::Ready,
            detail: Some(ItemDetail {
                description: format!("Full recipe for {}", item.title),
                image_ref: Some(format!("images/{}-{}.png", unit.index, item.index)),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_protocol::session_models::ConfigPatch;
    use tokio_stream::StreamExt;

    fn two_week_config() -> GenerationConfig {
        let mut config = GenerationConfig::default();
        config.apply(ConfigPatch {
            week_count: Some(2),
            source_id: Some("inv-1".to_string()),
            prefer_inventory: None,
        });
        config
    }

    #[tokio::test]
    async fn test_mock_streams_full_plan() {
        let service = MockGenerationService::succeeding(3);
        let stream = service.generate_plan(&two_week_config()).await.unwrap();
        let units: Vec<_> = stream.collect().await;

        assert_eq!(units.len(), 14);
        let first = units[0].as_ref().unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(first.label, "Day 1");
        assert_eq!(first.items.len(), 3);
        assert_eq!(first.items[0].state, ItemState::Pending);
    }

    #[tokio::test]
    async fn test_mock_fails_once_then_recovers() {
        let service = MockGenerationService::failing_after_units(3, 4);

        let stream = service.generate_plan(&two_week_config()).await.unwrap();
        let first_run: Vec<_> = stream.collect().await;
        assert_eq!(first_run.len(), 5);
        assert!(first_run[..4].iter().all(|u| u.is_ok()));
        assert!(matches!(first_run[4], Err(ServiceError::Transport(_))));

        // The fault is one-shot: a retry streams the whole plan.
        let stream = service.generate_plan(&two_week_config()).await.unwrap();
        let second_run: Vec<_> = stream.collect().await;
        assert_eq!(second_run.len(), 14);
        assert!(second_run.iter().all(|u| u.is_ok()));
    }

    #[tokio::test]
    async fn test_mock_detail_generation() {
        let service = MockGenerationService::succeeding(2);
        let unit = MockGenerationService::build_unit(0, 2, false);

        let detailed = service.generate_details(&unit, &unit.items[0]).await.unwrap();
        assert_eq!(detailed.state, ItemState::Ready);
        let detail = detailed.detail.unwrap();
        assert_eq!(detail.description, "Full recipe for Meal 1");
        assert!(detail.image_ref.is_some());
    }

    #[tokio::test]
    async fn test_mock_failing_item_is_isolated() {
        let service = MockGenerationService::succeeding(2).with_failing_item(0, 1);
        let unit = MockGenerationService::build_unit(0, 2, false);

        let ok = service.generate_details(&unit, &unit.items[0]).await;
        assert!(ok.is_ok());

        let failed = service.generate_details(&unit, &unit.items[1]).await;
        assert!(matches!(failed, Err(ServiceError::Item(_))));
    }

    #[tokio::test]
    async fn test_mock_detail_transport_faults_are_consumed() {
        let service = MockGenerationService::succeeding(2).with_detail_transport_faults(1);
        let unit = MockGenerationService::build_unit(0, 2, false);

        let first = service.generate_details(&unit, &unit.items[0]).await;
        assert!(matches!(first, Err(ServiceError::Transport(_))));

        // The fault budget is spent; the same call now succeeds.
        let second = service.generate_details(&unit, &unit.items[0]).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_mock_regenerate_unit_produces_fresh_items() {
        let service = MockGenerationService::succeeding(3);
        let unit = service
            .regenerate_unit(&two_week_config(), 3)
            .await
            .unwrap();

        assert_eq!(unit.index, 3);
        assert_eq!(unit.label, "Day 4");
        assert!(unit.items.iter().all(|i| i.title.contains("alternative")));
    }
}
