use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConversationTurn {
    pub role: String, // "user" or "assistant"
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Row in `assistant_conversations`. One document per user/trip thread,
/// turns appended in order.
#[derive(Debug, Deserialize, Serialize)]
pub struct AssistantConversation {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub trip_id: Option<ObjectId>,
    pub turns: Vec<ConversationTurn>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
