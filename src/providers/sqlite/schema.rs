diesel::table! {
    chats (id) {
        id -> Text,
        user_id -> Text,
        character_id -> Text,
        title -> Text,
        status -> Text,
        message_count -> BigInt,
        total_characters -> BigInt,
        last_message_at -> Nullable<BigInt>,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

diesel::table! {
    messages (id) {
        id -> Text,
        chat_id -> Text,
        role -> Text,
        dialogue -> Text,
        character_action -> Nullable<Text>,
        scene_description -> Nullable<Text>,
        emotional_state -> Nullable<Text>,
        engine -> Nullable<Text>,
        response_time_ms -> Nullable<BigInt>,
        nsfw_level -> Integer,
        is_regenerated -> Bool,
        created_at -> BigInt,
    }
}

diesel::table! {
    relationships (id) {
        id -> Text,
        user_id -> Text,
        character_id -> Text,
        chat_id -> Text,
        affection -> BigInt,
        mood -> Text,
        stage -> Text,
        intimacy -> Text,
        total_interactions -> BigInt,
        emotion_data -> Text,
        last_interaction -> Nullable<BigInt>,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

diesel::table! {
    long_term_memories (id) {
        id -> Text,
        user_id -> Text,
        character_id -> Text,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

diesel::table! {
    memory_preferences (id) {
        id -> Text,
        memory_id -> Text,
        category -> Text,
        content -> Text,
        importance -> BigInt,
        evidence -> Text,
        created_at -> BigInt,
    }
}

diesel::table! {
    memory_nicknames (id) {
        id -> Text,
        memory_id -> Text,
        name -> Text,
        frequency -> BigInt,
        last_used -> BigInt,
    }
}

diesel::table! {
    memory_milestones (id) {
        id -> Text,
        memory_id -> Text,
        milestone_type -> Text,
        description -> Text,
        affection -> BigInt,
        occurred_at -> BigInt,
    }
}

diesel::table! {
    memory_dislikes (id) {
        id -> Text,
        memory_id -> Text,
        topic -> Text,
        severity -> BigInt,
        evidence -> Text,
        recorded_at -> BigInt,
    }
}

diesel::table! {
    memory_personal_info (id) {
        id -> Text,
        memory_id -> Text,
        info_type -> Text,
        content -> Text,
        updated_at -> BigInt,
    }
}

diesel::joinable!(messages -> chats (chat_id));
diesel::joinable!(relationships -> chats (chat_id));
diesel::joinable!(memory_preferences -> long_term_memories (memory_id));
diesel::joinable!(memory_nicknames -> long_term_memories (memory_id));
diesel::joinable!(memory_milestones -> long_term_memories (memory_id));
diesel::joinable!(memory_dislikes -> long_term_memories (memory_id));
diesel::joinable!(memory_personal_info -> long_term_memories (memory_id));

diesel::allow_tables_to_appear_in_same_query!(
    chats,
    messages,
    relationships,
    long_term_memories,
    memory_preferences,
    memory_nicknames,
    memory_milestones,
    memory_dislikes,
    memory_personal_info,
);
