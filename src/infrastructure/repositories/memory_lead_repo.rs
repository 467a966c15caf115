// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::models::lead::LeadRecord;
use crate::domain::repositories::lead_repository::{LeadRepository, RepositoryError};

/// 内存线索仓库
#[derive(Default)]
pub struct InMemoryLeadRepository {
    leads: RwLock<Vec<LeadRecord>>,
}

impl InMemoryLeadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_leads(leads: Vec<LeadRecord>) -> Self {
        Self {
            leads: RwLock::new(leads),
        }
    }

    pub fn snapshot(&self) -> Vec<LeadRecord> {
        self.leads.read().clone()
    }
}

#[async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn append(&self, lead: &LeadRecord) -> Result<(), RepositoryError> {
        self.leads.write().push(lead.clone());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<LeadRecord>, RepositoryError> {
        Ok(self.snapshot())
    }

    async fn rewrite_all(&self, leads: &[LeadRecord]) -> Result<(), RepositoryError> {
        *self.leads.write() = leads.to_vec();
        Ok(())
    }
}
