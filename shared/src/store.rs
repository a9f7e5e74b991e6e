//! MySQL persistence for candles and signals

use crate::entity::{candles, signal_events};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use engine::data::{Candle, CandleDuration, CandleStore, SignalStore};
use engine::portfolio::{Side, SignalEvent};
use engine::{EngineError, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

fn storage(e: DbErr) -> EngineError {
    EngineError::Storage(e.to_string())
}

impl From<&Candle> for candles::ActiveModel {
    fn from(candle: &Candle) -> Self {
        Self {
            product_code: ActiveValue::Set(candle.product_code.clone()),
            duration: ActiveValue::Set(candle.duration.as_str().to_string()),
            time: ActiveValue::Set(candle.time),
            open: ActiveValue::Set(candle.open),
            high: ActiveValue::Set(candle.high),
            low: ActiveValue::Set(candle.low),
            close: ActiveValue::Set(candle.close),
            volume: ActiveValue::Set(candle.volume),
        }
    }
}

impl TryFrom<candles::Model> for Candle {
    type Error = EngineError;

    fn try_from(model: candles::Model) -> Result<Self> {
        let duration: CandleDuration = model.duration.parse()?;
        Ok(Candle::new(
            model.product_code,
            duration,
            model.time,
            model.open,
            model.high,
            model.low,
            model.close,
            model.volume,
        ))
    }
}

impl From<&SignalEvent> for signal_events::ActiveModel {
    fn from(event: &SignalEvent) -> Self {
        Self {
            product_code: ActiveValue::Set(event.product_code.clone()),
            time: ActiveValue::Set(event.time),
            side: ActiveValue::Set(event.side.as_str().to_string()),
            price: ActiveValue::Set(event.price),
            size: ActiveValue::Set(event.size),
        }
    }
}

impl TryFrom<signal_events::Model> for SignalEvent {
    type Error = EngineError;

    fn try_from(model: signal_events::Model) -> Result<Self> {
        let side: Side = model.side.parse().map_err(EngineError::Storage)?;
        Ok(SignalEvent {
            time: model.time,
            product_code: model.product_code,
            side,
            price: model.price,
            size: model.size,
        })
    }
}

/// Candle and signal store backed by SeaORM
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CandleStore for SeaOrmStore {
    async fn get_candle(
        &self,
        product_code: &str,
        duration: CandleDuration,
        time: DateTime<Utc>,
    ) -> Result<Option<Candle>> {
        candles::Entity::find_by_id((product_code.to_string(), duration.as_str().to_string(), time))
            .one(&self.db)
            .await
            .map_err(storage)?
            .map(Candle::try_from)
            .transpose()
    }

    async fn upsert_candle(&self, candle: &Candle) -> Result<()> {
        candles::Entity::insert(candles::ActiveModel::from(candle))
            .on_conflict(
                OnConflict::columns([
                    candles::Column::ProductCode,
                    candles::Column::Duration,
                    candles::Column::Time,
                ])
                .update_columns([
                    candles::Column::Open,
                    candles::Column::High,
                    candles::Column::Low,
                    candles::Column::Close,
                    candles::Column::Volume,
                ])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn latest_candles(
        &self,
        product_code: &str,
        duration: CandleDuration,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let models = candles::Entity::find()
            .filter(candles::Column::ProductCode.eq(product_code))
            .filter(candles::Column::Duration.eq(duration.as_str()))
            .order_by_desc(candles::Column::Time)
            .limit(limit as u64)
            .all(&self.db)
            .await
            .map_err(storage)?;

        let mut candles = models
            .into_iter()
            .map(Candle::try_from)
            .collect::<Result<Vec<_>>>()?;
        candles.reverse();
        Ok(candles)
    }
}

#[async_trait]
impl SignalStore for SeaOrmStore {
    async fn append_signal(&self, event: &SignalEvent) -> Result<()> {
        signal_events::Entity::insert(signal_events::ActiveModel::from(event))
            .exec_without_returning(&self.db)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn latest_signals(&self, product_code: &str, limit: usize) -> Result<Vec<SignalEvent>> {
        let models = signal_events::Entity::find()
            .filter(signal_events::Column::ProductCode.eq(product_code))
            .order_by_desc(signal_events::Column::Time)
            .limit(limit as u64)
            .all(&self.db)
            .await
            .map_err(storage)?;

        let mut events = models
            .into_iter()
            .map(SignalEvent::try_from)
            .collect::<Result<Vec<_>>>()?;
        events.reverse();
        Ok(events)
    }

    async fn signals_after(&self, product_code: &str, time: DateTime<Utc>) -> Result<Vec<SignalEvent>> {
        signal_events::Entity::find()
            .filter(signal_events::Column::ProductCode.eq(product_code))
            .filter(signal_events::Column::Time.gte(time))
            .order_by_asc(signal_events::Column::Time)
            .all(&self.db)
            .await
            .map_err(storage)?
            .into_iter()
            .map(SignalEvent::try_from)
            .collect()
    }
}
