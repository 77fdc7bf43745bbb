// server/src/pipelines/common_steps.rs

//! Transaction steps shared by every pipeline whose context implements `TransactionalCtx`.

use crate::errors::{AppError, Result};
use crate::pipelines::contexts::TransactionalCtx;
use tracing::{debug, instrument};
use unisale_core::PipelineControl;

#[instrument(name = "common_step::begin_transaction", skip_all, err(Display))]
pub async fn begin_transaction<C: TransactionalCtx>(ctx: &mut C) -> Result<PipelineControl> {
  if ctx.tx_slot().is_some() {
    return Err(AppError::Internal("Store transaction already open".to_string()));
  }
  let store = ctx.store().clone();
  let tx = store.begin().await?;
  *ctx.tx_slot() = Some(tx);
  debug!("Store transaction opened.");
  Ok(PipelineControl::Continue)
}

#[instrument(name = "common_step::commit_transaction", skip_all, err(Display))]
pub async fn commit_transaction<C: TransactionalCtx>(ctx: &mut C) -> Result<PipelineControl> {
  let tx = ctx
    .tx_slot()
    .take()
    .ok_or_else(|| AppError::Internal("No open store transaction to commit".to_string()))?;
  tx.commit().await?;
  debug!("Store transaction committed.");
  Ok(PipelineControl::Continue)
}
