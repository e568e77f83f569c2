//! Activity upload to a Strava-style API.
//!
//! Invoked by the shell only after a run has ended; nothing here can reach
//! back into session state, so an upload failure cannot corrupt or revive
//! a finished chase.

use geo::Point;
use serde::{Deserialize, Serialize};

use crate::session::RunSummary;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("activity api request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("activity api rejected the request ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Payload for creating an activity.
#[derive(Debug, Clone, Serialize)]
pub struct NewActivity {
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub start_date_local: String,
    pub elapsed_time: u64,
    pub distance: f64,
    pub description: String,
}

impl NewActivity {
    /// Describe a finished chase as a run activity.
    pub fn from_run(run: &RunSummary) -> Self {
        let outcome = if run.captured {
            "Caught by the slug"
        } else {
            "Outran the slug"
        };
        NewActivity {
            name: "Slug chase".to_string(),
            activity_type: "Run".to_string(),
            start_date_local: run.started_at.to_rfc3339(),
            elapsed_time: run.duration_s.round() as u64,
            distance: run.distance_m,
            description: format!("{outcome} after {:.0} m, {} coins", run.distance_m, run.coins),
        }
    }
}

/// An activity as the API reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct Activity {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub start_date_local: String,
    pub elapsed_time: u64,
    pub distance: f64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatLngStream {
    latlng: LatLngData,
}

#[derive(Debug, Deserialize)]
struct LatLngData {
    /// (latitude, longitude) pairs, in the API's order.
    data: Vec<[f64; 2]>,
}

impl LatLngStream {
    fn into_points(self) -> Vec<Point> {
        self.latlng
            .data
            .into_iter()
            .map(|[lat, lng]| Point::new(lng, lat))
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    message: String,
}

pub struct ActivityClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl ActivityClient {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        ActivityClient {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    pub async fn upload(&self, activity: &NewActivity) -> Result<Activity, UploadError> {
        let response = self
            .http
            .post(format!("{}/activities", self.base_url))
            .bearer_auth(&self.access_token)
            .json(activity)
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn recent_activities(&self, per_page: u32) -> Result<Vec<Activity>, UploadError> {
        let response = self
            .http
            .get(format!(
                "{}/athlete/activities?per_page={per_page}",
                self.base_url
            ))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Self::parse(response).await
    }

    /// Recorded route of a past activity, for drawing on the map.
    pub async fn activity_route(&self, id: u64) -> Result<Vec<Point>, UploadError> {
        let response = self
            .http
            .get(format!(
                "{}/activities/{id}/streams?keys=latlng&key_by_type=true",
                self.base_url
            ))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let stream: LatLngStream = Self::parse(response).await?;
        Ok(stream.into_points())
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, UploadError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiMessage>()
                .await
                .map(|m| m.message)
                .unwrap_or_default();
            return Err(UploadError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}
