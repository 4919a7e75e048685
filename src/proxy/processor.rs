//! Per-candidate pipeline: validate, classify, claim, probe, store

use crate::error::{ProxyError, Result};
use crate::proxy::checker::Prober;
use crate::proxy::classifier::AddressClassifier;
use crate::proxy::ledger::DedupLedger;
use crate::proxy::models::{ProxyRecord, ProxyType};
use crate::proxy::parser::ProxyParser;
use crate::proxy::store::ProxyStore;
use std::sync::Arc;

/// Runs one raw candidate through the whole pipeline.
///
/// Cheap to clone; every clone shares the same ledger, store and prober.
#[derive(Clone)]
pub struct ProxyProcessor {
    classifier: Arc<AddressClassifier>,
    ledger: Arc<DedupLedger>,
    prober: Arc<dyn Prober>,
    store: Arc<ProxyStore>,
}

impl ProxyProcessor {
    pub fn new(classifier: AddressClassifier, prober: Arc<dyn Prober>, store: Arc<ProxyStore>) -> Self {
        Self {
            classifier: Arc::new(classifier),
            ledger: Arc::new(DedupLedger::new()),
            prober,
            store,
        }
    }

    pub fn store(&self) -> &Arc<ProxyStore> {
        &self.store
    }

    /// Process one raw candidate for `category`.
    ///
    /// Validation failures return before the ledger or the network is touched.
    /// A pair already claimed earlier in the run yields `AlreadyProcessed`.
    /// Unchecked candidates are stored with zero timing and no timestamp.
    pub async fn process_proxy(
        &self,
        category: &ProxyType,
        raw: &str,
        is_checked: bool,
    ) -> Result<ProxyRecord> {
        let address = ProxyParser::validate(raw)?;
        let proxy = address.to_simple_string();

        if self.classifier.is_special(&address.ip) {
            return Err(ProxyError::SpecialAddress(proxy));
        }

        if !self.ledger.claim(category, &proxy) {
            return Err(ProxyError::AlreadyProcessed(DedupLedger::key(category, &proxy)));
        }

        let record = if is_checked {
            self.prober.check(category, &address).await?
        } else {
            ProxyRecord::unchecked(category.clone(), &address)
        };

        self.store.store(&record);

        Ok(record)
    }
}
