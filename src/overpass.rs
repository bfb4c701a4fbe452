use std::time::Duration;

use bytes::Bytes;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::bounding_box::BoundingBox;
use crate::config::QuerySettings;
use crate::error::{SceneError, SceneResult};
use crate::kernel_in::{MemberRole, MemberWay, RawPoint, TaggedElement, Tags};
use crate::tagticks::PolicyTable;

///////////////////////////////////////////////////////////////////////////////////////////////////
// Overpass JSON //////////////////////////////////////////////////////////////////////////////////

// Query result of `out geom;`. Missing nodes are `null` in a geometry list.
#[derive(Deserialize, Debug, Clone)]
pub struct JsonMember {
    #[serde(rename = "type")]
    member_type: String,
    #[serde(rename = "ref")]
    reference: u64,
    #[serde(default)]
    role: String,
    #[serde(default)]
    geometry: Vec<Option<RawPoint>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct JsonElement {
    id: u64,
    #[serde(rename = "type")]
    element_type: String,
    #[serde(default)]
    geometry: Vec<Option<RawPoint>>,
    #[serde(default)]
    members: Vec<JsonMember>,
    #[serde(default)]
    tags: Tags,
}

#[derive(Deserialize, Debug)]
pub struct JsonData {
    pub elements: Vec<JsonElement>,
}

fn raw_points(geometry: Vec<Option<RawPoint>>) -> Vec<RawPoint> {
    geometry
        .into_iter()
        .map(|point| point.unwrap_or(RawPoint::MISSING))
        .collect()
}

fn member_way(member: JsonMember, relation_id: u64) -> Option<MemberWay> {
    if member.member_type != "way" {
        return None;
    }
    let role = match member.role.as_str() {
        // old multipolygons have untagged outer ways
        "outer" | "" => MemberRole::Outer,
        "inner" => MemberRole::Inner,
        other => {
            debug!("relation {relation_id}: member role {other} ignored");
            return None;
        }
    };
    Some(MemberWay {
        reference: member.reference,
        role,
        points: raw_points(member.geometry),
    })
}

pub fn scan_json_to_elements(json_data: JsonData) -> Vec<TaggedElement> {
    let mut elements = Vec::new();
    for element in json_data.elements {
        match element.element_type.as_str() {
            "way" => elements.push(TaggedElement::way(
                element.id,
                element.tags,
                raw_points(element.geometry),
            )),

            "relation" => {
                let id = element.id;
                let members = element
                    .members
                    .into_iter()
                    .filter_map(|member| member_way(member, id))
                    .collect();
                elements.push(TaggedElement::relation(id, element.tags, members));
            }

            "node" => (),

            _ => warn!(
                "Unknown element type: {}  id: {}",
                element.element_type, element.id
            ),
        }
    }
    elements
}

pub fn scan_json_bytes(bytes: &Bytes) -> SceneResult<Vec<TaggedElement>> {
    let json_data: JsonData = serde_json::from_slice(bytes)?;
    Ok(scan_json_to_elements(json_data))
}

pub fn scan_json_str(json: &str) -> SceneResult<Vec<TaggedElement>> {
    let json_data: JsonData = serde_json::from_str(json)?;
    Ok(scan_json_to_elements(json_data))
}

/// One `way`/`relation` clause pair per tag key of the table.
pub fn build_query(bounding_box: &BoundingBox, table: &PolicyTable, timeout_secs: u64) -> String {
    let bbox = bounding_box.to_query_string();
    let mut query = format!("[out:json][timeout:{timeout_secs}];(");
    for key in table.tag_keys() {
        query.push_str(&format!("way[\"{key}\"]({bbox});relation[\"{key}\"]({bbox});"));
    }
    query.push_str(");out geom;");
    query
}

///////////////////////////////////////////////////////////////////////////////////////////////////
// Client /////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug)]
pub struct OverpassClient {
    settings: QuerySettings,
    client: reqwest::Client,
}

impl OverpassClient {
    pub fn new(settings: QuerySettings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
        }
    }

    /// Runs the query, one request at a time. Failed requests are repeated up to
    /// `max_attempts` times, `retry_interval_secs` apart. An empty answer is `NoData`.
    pub async fn query(
        &self,
        bounding_box: &BoundingBox,
        table: &PolicyTable,
    ) -> SceneResult<Vec<TaggedElement>> {
        let query = build_query(bounding_box, table, self.settings.timeout_secs);
        debug!("= Overpass query: {query}");

        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.fetch(&query).await {
                Ok(elements) if elements.is_empty() => {
                    warn!("Overpass: empty result for {bounding_box}");
                    return Err(SceneError::NoData { attempts: attempt });
                }
                Ok(elements) => {
                    info!("Overpass: {} elements (attempt {attempt})", elements.len());
                    return Ok(elements);
                }
                Err(error) => warn!("Overpass attempt {attempt}/{max_attempts} failed: {error}"),
            }

            if attempt >= max_attempts {
                return Err(SceneError::NoData { attempts: attempt });
            }
            tokio::time::sleep(Duration::from_secs(self.settings.retry_interval_secs)).await;
        }
    }

    async fn fetch(&self, query: &str) -> SceneResult<Vec<TaggedElement>> {
        let response = self
            .client
            .post(&self.settings.endpoint)
            .form(&[("data", query)])
            .send()
            .await?;
        match response.status().as_u16() {
            200 => (),
            400 => warn!("Bad Request: query rejected (400)"),
            429 => warn!("Too Many Requests: rate limited (429)"),
            504 => warn!("Gateway Timeout: server busy (504)"),
            status => warn!("Overpass error: {status}"),
        }
        let response = response.error_for_status()?;
        let bytes = response.bytes().await?;
        scan_json_bytes(&bytes)
    }
}
