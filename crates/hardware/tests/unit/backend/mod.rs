/// Bank/row timing, busy windows, and data storage of the reference memory.
pub mod banked;
