/// All possible actions in the application (command pattern)
#[derive(Clone, Debug)]
pub enum Action {
    // Lifecycle
    Quit,

    // UI toggles
    ToggleHelp,
    ToggleStats,
    ToggleTimestamps,
    ToggleAutoScroll,

    // Scrolling
    ScrollUp(usize),
    ScrollDown(usize),
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,

    // Filter criteria
    CycleLevelFilter,
    OpenServiceInput,
    OpenTextSearch,
    InputChar(char),
    InputBackspace,
    InputClear,
    ApplyInput,
    CancelInput,
    ClearFilters,

    // Error handling
    ShowError(String),
    DismissError,

    // Tick (for periodic updates)
    Tick,

    // Render request
    Render,
}
