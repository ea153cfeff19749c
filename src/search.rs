use crate::bbox::{self, BoundingBox};
use crate::candidates;
use crate::config::Config;
use crate::error::{CpError, Result};
use crate::geocoder::NominatimGeocoder;
use crate::isochrone::{Catchment, IsochroneClient};
use crate::overpass::OverpassClient;
use crate::planner::{self, SearchBudget, StepMode};
use crate::projection::AreaProjection;
use crate::resolver::{CoordinateResolver, Geocoder, SearchOrigin};
use crate::selector::{self, CandidateSet};

/// What the planner asked for.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// "lat, long" or a free-text address of the last known position.
    pub location: String,
    pub elapsed_hours: f64,
    pub walking_speed_kmh: f64,
    pub step_mode: StepMode,
    /// Overrides `search.max_candidates` from the config.
    pub max_candidates: Option<usize>,
}

impl SearchRequest {
    pub fn new(location: impl Into<String>, elapsed_hours: f64, walking_speed_kmh: f64) -> Self {
        Self {
            location: location.into(),
            elapsed_hours,
            walking_speed_kmh,
            step_mode: StepMode::Single,
            max_candidates: None,
        }
    }
}

/// Everything a map or report needs from one search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub origin: SearchOrigin,
    pub budget: SearchBudget,
    pub catchment: Catchment,
    pub query_box: BoundingBox,
    pub candidates: CandidateSet,
}

/// The catchment-and-candidate pipeline wired to its external services.
pub struct CpSearch<G = NominatimGeocoder> {
    resolver: CoordinateResolver<G>,
    isochrones: IsochroneClient,
    overpass: OverpassClient,
    projection: AreaProjection,
    max_candidates: usize,
}

impl CpSearch<NominatimGeocoder> {
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_geocoder(config, NominatimGeocoder::new(&config.geocoder)?)
    }
}

impl<G: Geocoder> CpSearch<G> {
    pub fn with_geocoder(config: &Config, geocoder: G) -> Result<Self> {
        config.validate()?;
        if config.isochrone.api_key.is_none() {
            tracing::warn!("No isochrone API key configured, requests go out unauthenticated");
        }
        let projection = config.area.projection()?;
        // Fail on an unknown CRS now rather than after the service calls
        projection
            .projector()
            .map_err(|e| CpError::Config(e.to_string()))?;

        Ok(Self {
            resolver: CoordinateResolver::new(geocoder),
            isochrones: IsochroneClient::new(&config.isochrone)?,
            overpass: OverpassClient::new(&config.overpass)?,
            projection,
            max_candidates: config.search.max_candidates,
        })
    }

    /// Run one search from scratch. Any service failure fails the whole search.
    pub async fn run(&self, request: &SearchRequest) -> Result<SearchOutcome> {
        // Budget first, bad input must not cost a network call
        let budget = planner::plan(
            request.elapsed_hours,
            request.walking_speed_kmh,
            request.step_mode,
        )?;
        let ranges = budget.positive_steps();
        if ranges.is_empty() {
            return Err(CpError::InvalidBudget(format!(
                "no isochrone ring below {} m at {} km/h",
                budget.distance_budget_m, budget.walking_speed_kmh
            )));
        }
        let max_candidates = request.max_candidates.unwrap_or(self.max_candidates);
        if max_candidates == 0 {
            return Err(CpError::InvalidRequest(
                "max candidates must be at least 1".to_string(),
            ));
        }

        let origin = self.resolver.resolve(&request.location).await?;
        tracing::info!(
            "Searching from ({}, {}) within {} m",
            origin.latitude,
            origin.longitude,
            budget.distance_budget_m
        );

        let catchment = self.isochrones.fetch_catchment(&origin, &ranges).await?;
        let query_box = bbox::to_query_box(catchment.native_bbox);

        let features = self.overpass.fetch_parkings(&query_box).await?;
        let projector = self
            .projection
            .projector()
            .map_err(|e| CpError::Config(e.to_string()))?;
        let sized = candidates::process(&features, &projector);
        let candidates = selector::select(sized, max_candidates);

        tracing::info!(
            "Selected {} of {} parking ways as command post candidates",
            candidates.len(),
            features.len()
        );

        Ok(SearchOutcome {
            origin,
            budget,
            catchment,
            query_box,
            candidates,
        })
    }
}
