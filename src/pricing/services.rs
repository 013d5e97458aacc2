//! Rate desk service functions with store access.
//!
//! Everything a caller does goes through `RateService`: it resolves the acting
//! user, checks the injected permission function, reads rates through the
//! cache, runs the engine and writes the audit trail. The engine itself stays
//! pure.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::access::{self, Permission, PermissionCheck, User, UserDirectory};
use crate::audit::{AuditAction, AuditEntry, AuditLog};
use crate::cache::AppCache;
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::store::{self, KeyValueStore, CURRENT_USER_KEY, RATES_KEY};

use super::calculators::calculate;
use super::models::{RateTable, ServiceType};
use super::requests::TripRequest;
use super::responses::{Breakdown, RateOverview, RatePreview};

/// Rate desk backed by a key-value store
pub struct RateService<S: KeyValueStore> {
    store: S,
    cache: AppCache,
    directory: UserDirectory,
    audit: AuditLog,
    permission_check: PermissionCheck,
}

impl<S: KeyValueStore> RateService<S> {
    /// Build a service over `store`, loading the persisted audit log
    pub fn new(store: S, config: &AppConfig) -> Self {
        let audit = AuditLog::load(&store, config.audit_capacity);
        debug!("Loaded {} audit entries", audit.len());
        Self {
            store,
            cache: AppCache::new(config.rate_cache_ttl),
            directory: UserDirectory::default(),
            audit,
            permission_check: access::has_permission,
        }
    }

    /// Replace the role policy
    pub fn with_permission_check(mut self, check: PermissionCheck) -> Self {
        self.permission_check = check;
        self
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The user currently at the desk.
    ///
    /// Falls back to the default user when nothing is saved or the saved id
    /// no longer exists.
    pub fn current_user(&self) -> Result<User> {
        let saved = match store::load_json::<u32, S>(&self.store, CURRENT_USER_KEY) {
            Ok(saved) => saved,
            Err(e) => {
                warn!("Ignoring unreadable current user: {}", e);
                None
            }
        };

        if let Some(user) = saved.and_then(|id| self.directory.find(id)) {
            return Ok(user.clone());
        }

        self.directory
            .default_user()
            .cloned()
            .ok_or_else(|| AppError::Config("User directory is empty".to_string()))
    }

    /// Whether the current user may perform `permission`
    pub fn can(&self, permission: Permission) -> Result<bool> {
        let user = self.current_user()?;
        Ok((self.permission_check)(user.role, permission))
    }

    fn require(&self, permission: Permission) -> Result<User> {
        let user = self.current_user()?;
        if (self.permission_check)(user.role, permission) {
            Ok(user)
        } else {
            info!("Denied {} to {} ({})", permission, user.name, user.role);
            Err(AppError::PermissionDenied {
                role: user.role,
                permission,
            })
        }
    }

    fn record(&mut self, entry: AuditEntry) -> Result<()> {
        self.audit.record(entry);
        self.audit.save(&mut self.store)
    }

    /// Price a trip as the current user and audit the result
    pub fn quote(&mut self, request: &TripRequest) -> Result<Breakdown> {
        let user = self.require(Permission::CalculateRates)?;
        let table = self.cache.rates(&self.store)?;

        let breakdown = calculate(&table, request);
        debug!(
            "Quoted {} {} {}: total {}",
            request.service_type, request.rate_type, request.trip_type, breakdown.total
        );

        let details = format!(
            "{} {} trip, {} miles: ${}",
            request.service_type.label(),
            request.trip_type.label(),
            breakdown.breakdown.display_miles,
            breakdown.total
        );
        let data = json!({ "request": request, "result": breakdown });
        self.record(AuditEntry::new(
            &user,
            AuditAction::RateCalculation,
            details,
            Some(data),
        ))?;

        Ok(breakdown)
    }

    /// Current rate table
    pub fn rates(&self) -> Result<Arc<RateTable>> {
        self.require(Permission::ViewSettings)?;
        self.cache.rates(&self.store)
    }

    /// Save a new rate table
    pub fn update_rates(&mut self, table: RateTable) -> Result<()> {
        let user = self.require(Permission::EditSettings)?;

        store::save_json(&mut self.store, RATES_KEY, &table)?;
        let data = serde_json::to_value(&table)?;
        self.cache.put_rates(table);
        info!("Rate table updated by {}", user.name);

        self.record(AuditEntry::new(
            &user,
            AuditAction::RatesUpdated,
            "Updated rate table",
            Some(data),
        ))
    }

    /// Restore the seed rate table
    pub fn reset_rates(&mut self) -> Result<()> {
        let user = self.require(Permission::EditSettings)?;

        self.store.remove(RATES_KEY)?;
        self.cache.invalidate_all();
        info!("Rate table reset to defaults by {}", user.name);

        self.record(AuditEntry::new(
            &user,
            AuditAction::RatesReset,
            "Reset rate table to defaults",
            None,
        ))
    }

    /// Regular-schedule ranges for the dashboard; open to everyone
    pub fn overview(&self) -> Result<RateOverview> {
        let table = self.cache.rates(&self.store)?;
        Ok(rate_overview(&table))
    }

    /// Worked example per service, as shown beside the rate editor
    pub fn preview(&self, miles: Decimal, deadhead_miles: Decimal) -> Result<Vec<RatePreview>> {
        self.require(Permission::ViewSettings)?;
        let table = self.cache.rates(&self.store)?;
        Ok(rate_previews(&table, miles, deadhead_miles))
    }

    /// Most recent audit entries
    pub fn audit_entries(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        self.require(Permission::ViewAudit)?;
        Ok(self.audit.latest(limit).to_vec())
    }

    /// Change who is at the desk
    pub fn switch_user(&mut self, id: u32) -> Result<User> {
        let user = self
            .directory
            .find(id)
            .cloned()
            .ok_or(AppError::UnknownUser(id))?;
        let previous = self.current_user()?;

        store::save_json(&mut self.store, CURRENT_USER_KEY, &user.id)?;
        info!("Switched from {} to {} ({})", previous.name, user.name, user.role);

        // Logged against whoever handed over the desk
        self.record(AuditEntry::new(
            &previous,
            AuditAction::UserSwitch,
            format!("Switched to user: {} ({})", user.name, user.role),
            None,
        ))?;

        Ok(user)
    }
}

/// Min/max of the regular base fares and mileage rates across services
pub fn rate_overview(table: &RateTable) -> RateOverview {
    let regular_base = ServiceType::ALL.map(|s| table.base_fares.regular.get(s));
    let regular_mileage = ServiceType::ALL.map(|s| table.mileage_rates.regular.get(s));

    let min = |values: &[Decimal]| values.iter().copied().min().unwrap_or(Decimal::ZERO);
    let max = |values: &[Decimal]| values.iter().copied().max().unwrap_or(Decimal::ZERO);

    RateOverview {
        base_fare_min: min(&regular_base[..]),
        base_fare_max: max(&regular_base[..]),
        mileage_rate_min: min(&regular_mileage[..]),
        mileage_rate_max: max(&regular_mileage[..]),
        deadhead_rate: table.deadhead_rate,
    }
}

/// Regular base fare plus straight mileage and deadhead, no rounding rules
pub fn rate_previews(table: &RateTable, miles: Decimal, deadhead_miles: Decimal) -> Vec<RatePreview> {
    ServiceType::ALL
        .into_iter()
        .map(|service_type| {
            let base_fare = table.base_fares.regular.get(service_type);
            let mileage_cost = table.mileage_rates.regular.get(service_type).saturating_mul(miles);
            let deadhead_cost = table.deadhead_rate.saturating_mul(deadhead_miles);
            RatePreview {
                service_type,
                miles,
                deadhead_miles,
                base_fare,
                mileage_cost,
                deadhead_cost,
                total: base_fare.saturating_add(mileage_cost).saturating_add(deadhead_cost),
            }
        })
        .collect()
}
