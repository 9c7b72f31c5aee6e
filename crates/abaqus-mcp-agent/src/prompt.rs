use std::env;

pub fn get_server_instructions() -> String {
    let current_os = env::consts::OS;
    let current_working_dir = env::current_dir()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|_| "Unknown".to_string());

    format!(
        "
This server executes Python scripts inside an ALREADY RUNNING Abaqus/CAE GUI session and retrieves the session's message log. It does not start or stop Abaqus/CAE.

**Tools**
*   `execute_script_in_abaqus_gui`: submits Abaqus Scripting Interface (ASI) Python code through the GUI's 'File -> Run Script...' dialog. The return value confirms submission only.
*   `get_abaqus_gui_message_log`: scrapes the message area at the bottom of the main window. This is where script output, Abaqus status messages and errors appear.
*   `abaqus_scripting_strategy`: returns the recommended workflow for combining the two tools.

**Key facts**
*   Script submission is not idempotent; every call runs the script again.
*   Always verify a submitted script's outcome through the message log. A successful submission says nothing about whether the script ran cleanly.
*   The GUI must be open and responsive. Unexpected modal dialogs block automation.

Contextual information:
- Current operating system: {current_os}.
- Current working directory: {current_working_dir}.
"
    )
}

pub fn scripting_strategy() -> String {
    "When performing tasks in an Abaqus/CAE GUI session via this MCP server:

1.  **Core Assumption:** This server interacts with an ALREADY RUNNING Abaqus/CAE GUI session. It does not start or stop Abaqus/CAE. Ensure the Abaqus/CAE application is open, responsive, and ideally the primary focused window when initiating tool calls.

2.  **Executing Python Scripts (`execute_script_in_abaqus_gui` tool):**
    *   **Purpose:** Run custom Python scripts within the Abaqus/CAE environment.
    *   **Input:** Provide the complete script as the `python_code` argument, containing valid Abaqus Scripting Interface (ASI) commands. The script should be self-contained, or any required models/files must already be loaded or accessible within the Abaqus session.
    *   **Mechanism:** The tool automates the 'File -> Run Script...' menu selection and dialog interaction in the Abaqus GUI.
    *   **Return Value:** A string confirming the script was *submitted*. It does NOT return your script's output (e.g., print statements) and does not catch Python exceptions raised inside Abaqus.
    *   **Idempotency:** Not idempotent. Calling it multiple times with the same script executes the script multiple times.
    *   **Checking Script Outcome:** After submitting, it is CRUCIAL to call `get_abaqus_gui_message_log`. The message area is where you will find completion confirmations, your script's print output, and any errors or warnings.

3.  **Retrieving Abaqus GUI Messages (`get_abaqus_gui_message_log` tool):**
    *   **Purpose:** Fetch the text content of the Abaqus/CAE message/log area (usually at the bottom of the main window).
    *   **Primary Use Cases:** Verifying the outcome of submitted scripts; checking for general status messages, warnings or errors from manual or scripted operations.
    *   **Reliability Note:** The message area is located heuristically and accuracy depends on the Abaqus version and UI configuration. If extraction is inaccurate or incomplete, the server's pane-identification settings may need adjustment for your environment.

4.  **Recommended Workflow for Script Execution & Verification:**
    a.  Ensure the Abaqus/CAE GUI is running, visible, and in a stable state (no blocking modal dialogs other than those the tools expect).
    b.  Formulate the Abaqus Python script (ASI commands) you want to run.
    c.  Call `execute_script_in_abaqus_gui` with your script string.
    d.  Note the confirmation message (script submitted).
    e.  Wait a reasonable amount of time for the script to execute within Abaqus; the duration depends on the script's complexity.
    f.  Call `get_abaqus_gui_message_log`.
    g.  Carefully examine the returned log to understand the actual outcome, including any errors or messages the script printed.

5.  **Troubleshooting GUI Interaction and Best Practices:**
    *   **Window State:** Avoid initiating actions while the Abaqus/CAE window is minimized. The tools restore and focus it, but an already active window is most reliable.
    *   **Modal Dialogs:** Unexpected modal dialogs in Abaqus can block the automation.
    *   **Tool Failures:** If `execute_script_in_abaqus_gui` fails (e.g., cannot find the dialog or its controls), the Abaqus state may be unexpected, the UI structure may have changed, or the window may be unresponsive. `get_abaqus_gui_message_log` (if it still works) may offer clues; otherwise inspect the GUI manually.
    *   **Script Errors vs. Tool Errors:** Distinguish errors returned by the MCP tools (e.g., 'dialog not found') from errors appearing in the Abaqus message log, which come from your script's execution within Abaqus.
"
    .to_string()
}
