//! Prompt templates for every model call the graph makes

/// Ask for a fresh profile from a single message
pub fn profile_create(message: &str) -> String {
    format!(
        r#"You extract loan-application details from a customer's message.

Return a single JSON object containing only the fields the message states explicitly.
Useful keys: name, phone, email, user_id, income, employment_type, loan_amount,
loan_type, loan_tenure (in months), interest_rate (annual %), property_value.
Do not add keys with null, empty or placeholder values. Do not guess.
If the message contains no such details, return {{}}.

Customer message: {message}

Respond with the JSON object only."#
    )
}

/// Ask for the complete merged profile given an existing one
pub fn profile_update(message: &str, current_profile: &str) -> String {
    format!(
        r#"You maintain a loan applicant's profile across a conversation.

Current profile:
{current_profile}

Latest customer message: {message}

Return the COMPLETE updated profile as a single JSON object.
- Keep every existing field exactly as it is unless the message clearly gives a new value for it.
- Add any new details the message states explicitly (loan_tenure in months, interest_rate as annual %).
- Never drop a field that the message does not mention.
- Do not invent values.

Respond with the JSON object only."#
    )
}

/// Ask the router to classify the next step
pub fn routing(lender: &str, message: &str, profile: &str) -> String {
    format!(
        r#"You are the routing agent for {lender} loans. Decide which specialist handles the customer's latest message.

Latest customer message: {message}

Customer profile:
{profile}

Choose exactly one action:
- "search_agent": questions about loan products, eligibility, interest rates, fees, charges or documents. Put one or more focused search queries in "queries".
- "emi_calculator": the customer wants an EMI figure AND the profile has loan_amount, interest_rate and loan_tenure.
- "sales_agent": everything else.

Respond in strict JSON, for example:
{{"action": "search_agent", "queries": ["documents required for personal loan", "personal loan processing charges"], "reason": "asks about documents and fees"}}
{{"action": "emi_calculator", "queries": [], "reason": "asks for EMI with all details present"}}
{{"action": "sales_agent", "queries": [], "reason": "general conversation"}}"#
    )
}

/// Everything the sales turn can see
#[derive(Debug, Clone, Copy)]
pub struct SalesContext<'a> {
    pub lender: &'a str,
    pub transcript: &'a str,
    pub profile: &'a str,
    pub credit_score: Option<u32>,
    pub pre_approved_amount: Option<&'a str>,
    pub search_digest: &'a str,
    pub emi_digest: &'a str,
}

/// Build the sales agent's prompt
pub fn sales(ctx: SalesContext<'_>) -> String {
    let lender = ctx.lender;
    let mut prompt = format!(
        "You are a professional sales agent for {lender} loans.

Your job:
- Understand the customer's needs: amount, purpose, repayment tenure.
- Explain {lender} loan products clearly and accurately, without false promises.
- Negotiate tenure and interest rate in a customer-friendly way, using the ranges from the search information.
- Tailor offers to the customer's credit score, income and employment.
- Keep replies short and conversational. You are chatting, not writing an essay.

Conversation so far:
{transcript}

Customer profile:
{profile}
",
        transcript = ctx.transcript,
        profile = ctx.profile,
    );

    if let Some(score) = ctx.credit_score {
        prompt.push_str(&format!("\nCredit score: {score}/900"));
    }
    if let Some(amount) = ctx.pre_approved_amount {
        prompt.push_str(&format!("\nPre-approved amount: ₹{amount}"));
    }
    if !ctx.search_digest.is_empty() {
        prompt.push_str("\n\nUse this product information when answering:\n");
        prompt.push_str(ctx.search_digest);
    }
    if !ctx.emi_digest.is_empty() {
        prompt.push_str("\n\nShare this EMI calculation with the customer:\n");
        prompt.push_str(ctx.emi_digest);
    }

    prompt.push_str("\n\nGenerate your reply now, as the sales agent.");
    prompt
}

/// Summarize one query's search results
pub fn summarize(lender: &str, query: &str, results: &str) -> String {
    format!(
        r#"Summarize the following search results for the customer's question about {lender} loans.

Question: {query}

Search results:
{results}

Rules:
- Stick to facts in the results; do not make up information.
- Keep every number: interest rates, fees, charges, tenure, eligibility criteria, required documents.
- Use short, dense bullet points with no pleasantries.
- If nothing relevant is present, reply "No relevant information found.""#
    )
}

/// Ask for search queries derived from the latest message
pub fn query_generation(lender: &str, message: &str, profile: &str) -> String {
    format!(
        r#"You are a search query generator for {lender} loan information.

Latest customer message: {message}

Customer profile:
{profile}

Write between 1 and 5 short web search queries that would find the facts needed to answer the message.
Respond in strict JSON: {{"queries": ["...", "..."]}}"#
    )
}

/// Prompt the synthetic customer for their next message
pub fn synthetic_user(persona: &str, transcript: &str) -> String {
    format!(
        "{persona}

Conversation so far:
{transcript}

Respond as the customer with your next message only. Do not prefix it with a speaker name."
    )
}
