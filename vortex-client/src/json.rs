//! DTOs for the site's plain JSON endpoints and the sov2ex search API.
//! These decode directly; the extraction engine is not involved.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRef {
    pub username: String,
    #[serde(default)]
    pub avatar_normal: String,
    #[serde(default)]
    pub avatar_large: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRef {
    pub name: String,
    pub title: String,
}

/// `/api/topics/hot.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotTopic {
    pub id: i64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub replies: i64,
    pub member: MemberRef,
    pub node: NodeRef,
    #[serde(default)]
    pub created: i64,
}

/// `/api/nodes/show.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub topics: i64,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub avatar_large: String,
}

/// One entry of `/api/nodes/s2.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSummary {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub topics: i64,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// `/api/members/show.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberInfo {
    pub id: i64,
    pub username: String,
    pub url: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar_large: String,
    #[serde(default)]
    pub created: i64,
}

/// sov2ex search response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_source")]
    pub source: SearchTopic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchTopic {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub member: String,
    #[serde(default)]
    pub node: i64,
    #[serde(default)]
    pub replies: i64,
    #[serde(default)]
    pub created: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hot_topics_decode() {
        let body = r#"[{
            "id": 1001,
            "title": "今天的热议",
            "url": "https://www.v2ex.com/t/1001",
            "replies": 42,
            "member": {"username": "alice", "avatar_large": "//cdn/a.png"},
            "node": {"name": "python", "title": "Python"},
            "created": 1683253393
        }]"#;
        let topics: Vec<HotTopic> = serde_json::from_str(body).unwrap();
        assert_eq!(topics[0].id, 1001);
        assert_eq!(topics[0].member.username, "alice");
        assert_eq!(topics[0].node.name, "python");
        // absent optional fields fall back to defaults
        assert_eq!(topics[0].content, "");
    }

    #[test]
    fn search_hits_decode_from_underscore_source() {
        let body = r#"{
            "total": 1,
            "hits": [{"_source": {"id": 7, "title": "rust 入门", "member": "bob",
                                   "node": 300, "replies": 3, "created": "2023-05-05T10:23:13Z"}}]
        }"#;
        let result: SearchResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.hits[0].source.title, "rust 入门");
    }
}
