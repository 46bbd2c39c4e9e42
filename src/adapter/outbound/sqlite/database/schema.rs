// Kept in sync with migrations/ by hand.

diesel::table! {
    wallets (id) {
        id -> Text,
        user_id -> Text,
        balance_cents -> BigInt,
        version -> BigInt,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    wallet_reservations (id) {
        id -> Text,
        wallet_id -> Text,
        external_ref -> Text,
        amount_cents -> BigInt,
        status -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    wallet_ledger (id) {
        id -> Integer,
        wallet_id -> Text,
        operation_type -> Text,
        amount_cents -> BigInt,
        description -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    bets (id) {
        id -> Text,
        user_id -> Text,
        event_id -> Text,
        market -> Text,
        selection -> Text,
        stake_cents -> BigInt,
        odd_value -> Text,
        status -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    bet_transactions (id) {
        id -> Integer,
        bet_id -> Text,
        old_status -> Text,
        new_status -> Text,
        reason -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    bus_messages (id) {
        id -> Integer,
        topic -> Text,
        partition_id -> Integer,
        msg_offset -> BigInt,
        msg_key -> Text,
        payload -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    bus_offsets (group_id, topic, partition_id) {
        group_id -> Text,
        topic -> Text,
        partition_id -> Integer,
        next_offset -> BigInt,
        updated_at -> Text,
    }
}

diesel::table! {
    odds_snapshots (event_id, market, selection) {
        event_id -> Text,
        market -> Text,
        selection -> Text,
        odd_value -> Text,
        updated_at -> Text,
    }
}

diesel::joinable!(wallet_reservations -> wallets (wallet_id));
diesel::joinable!(wallet_ledger -> wallets (wallet_id));

diesel::allow_tables_to_appear_in_same_query!(
    wallets,
    wallet_reservations,
    wallet_ledger,
    bets,
    bet_transactions,
    bus_messages,
    bus_offsets,
    odds_snapshots,
);
