use std::sync::Arc;

use crate::config::ImportConfig;
use crate::domain::constraints::ConstraintSet;
use crate::domain::model::Domain;
use crate::utils::error::Result;

/// 啟動時編譯好的規則與配置，由所有請求共用
#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: ImportConfig,
    car: ConstraintSet,
    liability: ConstraintSet,
}

impl AppState {
    pub fn new(config: ImportConfig) -> Result<Self> {
        let car = config.constraints_for(Domain::Car)?;
        let liability = config.constraints_for(Domain::Liability)?;

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                car,
                liability,
            }),
        })
    }

    pub fn config(&self) -> &ImportConfig {
        &self.inner.config
    }

    pub fn constraints(&self, domain: Domain) -> ConstraintSet {
        match domain {
            Domain::Car => self.inner.car.clone(),
            Domain::Liability => self.inner.liability.clone(),
        }
    }
}
