//! Programs read model — registered stablecoin programs by id and symbol.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{ClientId, PixKey, ProgramEvent, ProgramStatus, WalletAddress};
use event_log::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Denormalized summary of a stablecoin program.
#[derive(Debug, Clone)]
pub struct ProgramSummary {
    pub program_id: AggregateId,
    pub client_id: ClientId,
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
    pub client_wallet: WalletAddress,
    pub payout_pix_key: PixKey,
    pub webhook_url: String,
    pub status: ProgramStatus,
    pub contract_address: Option<WalletAddress>,
    pub registered_at: DateTime<Utc>,
}

/// Read model view over registered programs.
#[derive(Clone)]
pub struct ProgramsView {
    programs: Arc<RwLock<HashMap<AggregateId, ProgramSummary>>>,
    by_symbol: Arc<RwLock<HashMap<String, AggregateId>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl ProgramsView {
    /// Creates a new empty programs view.
    pub fn new() -> Self {
        Self {
            programs: Arc::new(RwLock::new(HashMap::new())),
            by_symbol: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets a summary of a specific program.
    pub async fn get_program(&self, program_id: AggregateId) -> Option<ProgramSummary> {
        self.programs.read().await.get(&program_id).cloned()
    }

    /// Looks up a program by its token symbol.
    pub async fn get_program_by_symbol(&self, symbol: &str) -> Option<ProgramSummary> {
        let program_id = *self.by_symbol.read().await.get(symbol)?;
        self.get_program(program_id).await
    }

    /// Gets all registered programs.
    pub async fn get_all_programs(&self) -> Vec<ProgramSummary> {
        self.programs.read().await.values().cloned().collect()
    }

    /// Gets programs owned by a specific client.
    pub async fn get_programs_by_client(&self, client_id: ClientId) -> Vec<ProgramSummary> {
        self.programs
            .read()
            .await
            .values()
            .filter(|p| p.client_id == client_id)
            .cloned()
            .collect()
    }
}

impl Default for ProgramsView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for ProgramsView {
    fn name(&self) -> &'static str {
        "ProgramsView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type != "StablecoinProgram" {
            let mut pos = self.position.write().await;
            *pos = pos.advance();
            return Ok(());
        }

        let program_event: ProgramEvent = serde_json::from_value(event.payload.clone())?;
        let program_id = event.aggregate_id;

        match program_event {
            ProgramEvent::ProgramRegistered(data) => {
                self.by_symbol
                    .write()
                    .await
                    .insert(data.symbol.clone(), program_id);
                self.programs.write().await.insert(
                    program_id,
                    ProgramSummary {
                        program_id,
                        client_id: data.client_id,
                        symbol: data.symbol,
                        name: data.name,
                        decimals: data.decimals,
                        client_wallet: data.client_wallet,
                        payout_pix_key: data.payout_pix_key,
                        webhook_url: data.webhook_url,
                        status: ProgramStatus::Registered,
                        contract_address: None,
                        registered_at: data.registered_at,
                    },
                );
            }
            ProgramEvent::ProgramDeployed(data) => {
                if let Some(program) = self.programs.write().await.get_mut(&program_id) {
                    program.status = ProgramStatus::Deployed;
                    program.contract_address = Some(data.contract_address);
                }
            }
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance();

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.programs.write().await.clear();
        self.by_symbol.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for ProgramsView {
    fn name(&self) -> &'static str {
        "ProgramsView"
    }

    fn count(&self) -> usize {
        // Use try_read to avoid blocking; returns 0 if lock is held
        self.programs.try_read().map(|p| p.len()).unwrap_or(0)
    }
}
