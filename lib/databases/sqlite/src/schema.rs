//  SCHEMA.rs
//
//  Created:
//    05 Nov 2024, 12:03:11
//  Last edited:
//    18 Oct 2026, 12:03:29
//  Auto updated?
//    Yes
//
//  Description:
//!   Mirrors the tables created by the embedded migrations.
//

diesel::table! {
    followers (user_id, follower_id) {
        user_id -> BigInt,
        follower_id -> BigInt,
        created_at -> Timestamp,
    }
}

diesel::table! {
    posts (id) {
        id -> BigInt,
        title -> Text,
        content -> Text,
        user_id -> BigInt,
        tags -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
        version -> BigInt,
    }
}

diesel::table! {
    roles (id) {
        id -> BigInt,
        name -> Text,
        level -> Integer,
        description -> Text,
    }
}

diesel::table! {
    user_invitations (token) {
        token -> Text,
        user_id -> BigInt,
        expiry -> Timestamp,
    }
}

diesel::table! {
    users (id) {
        id -> BigInt,
        username -> Text,
        email -> Text,
        created_at -> Timestamp,
        is_active -> Bool,
        role_id -> BigInt,
        password -> Nullable<Text>,
    }
}

diesel::joinable!(posts -> users (user_id));
diesel::joinable!(user_invitations -> users (user_id));
diesel::joinable!(users -> roles (role_id));

diesel::allow_tables_to_appear_in_same_query!(followers, posts, roles, user_invitations, users);
